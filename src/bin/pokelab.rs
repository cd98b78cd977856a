use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use pokelab::api::DEFAULT_BASE_URL;
use pokelab::select::{self, Characteristics};
use pokelab::{Analysis, Client, RetryPolicy, export, normalize, pipeline};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "pokelab",
    version,
    about = "Fetch, normalize & analyze Pokémon data from PokeAPI"
)]
struct Cli {
    #[command(flatten)]
    conn: ConnArgs,
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct ConnArgs {
    /// API base URL.
    #[arg(long, env = "POKELAB_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,
    /// Total attempts per request (1 means no retry).
    #[arg(long, env = "POKELAB_ATTEMPTS", default_value_t = 3, global = true)]
    attempts: u32,
    /// Backoff unit in milliseconds; retry n waits unit * 2^(n-1).
    #[arg(long, env = "POKELAB_BACKOFF_MS", default_value_t = 1000, global = true)]
    backoff_ms: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the first N Pokémon with their selection index.
    List {
        #[arg(short, long, default_value_t = 151)]
        limit: u32,
    },
    /// Show the characteristics of one Pokémon.
    Show(ShowArgs),
    /// Fetch N Pokémon and print every analysis.
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Pokémon name or numeric id.
    #[arg(conflicts_with = "index", required_unless_present = "index")]
    name: Option<String>,
    /// Index into the listing printed by `list`.
    #[arg(long)]
    index: Option<usize>,
    /// Listing size the index is validated against.
    #[arg(long, default_value_t = 151)]
    limit: u32,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Number of Pokémon to fetch (ids 1..=N).
    #[arg(short, long, default_value_t = 151)]
    limit: u32,
    /// Pokémon whose characteristics are printed first, if present.
    #[arg(long, default_value = "pikachu")]
    featured: String,
    /// Save the full analysis as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
    /// Save the normalized table as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Number of move-count rows to print per table (0 prints all).
    #[arg(long, default_value_t = 5)]
    head: usize,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let retry = RetryPolicy {
        max_attempts: cli.conn.attempts,
        base_delay: Duration::from_millis(cli.conn.backoff_ms),
    };
    let client = Client::new(&cli.conn.base_url, retry).context("build http client")?;

    match cli.cmd {
        Command::List { limit } => cmd_list(&client, limit),
        Command::Show(args) => cmd_show(&client, args),
        Command::Analyze(args) => cmd_analyze(&client, args),
    }
}

fn cmd_list(client: &Client, limit: u32) -> Result<()> {
    let listing = client.list_pokemon(limit).context("fetch listing")?;
    for (i, p) in listing.iter().enumerate() {
        println!("{i}: {}", p.name);
    }
    Ok(())
}

fn cmd_show(client: &Client, args: ShowArgs) -> Result<()> {
    let name = match (args.name, args.index) {
        (Some(name), _) => name,
        (None, Some(index)) => {
            let listing = client.list_pokemon(args.limit).context("fetch listing")?;
            select::select_index(&listing, index)?.name.clone()
        }
        (None, None) => anyhow::bail!("either a name or --index is required"),
    };
    let raw = client
        .fetch_pokemon(&name)
        .with_context(|| format!("fetch '{name}'"))?;
    let row = normalize(&raw).with_context(|| format!("normalize '{name}'"))?;
    print_characteristics(&Characteristics::from(&row));
    Ok(())
}

fn cmd_analyze(client: &Client, args: AnalyzeArgs) -> Result<()> {
    let analysis = pipeline::run(client, args.limit);
    let d = &analysis.diagnostics;
    if !d.failed_ids.is_empty() {
        eprintln!("Could not fetch {} record(s): {}", d.failed_ids.len(), d.failed_ids.join(", "));
    }
    if !d.rejected_ids.is_empty() {
        eprintln!("Skipped {} malformed record(s): {}", d.rejected_ids.len(), d.rejected_ids.join(", "));
    }
    analysis.require_records()?;

    if let Some(row) = analysis.table.get(&args.featured) {
        print_characteristics(&Characteristics::from(row));
    }
    print_analysis(&analysis, args.head);

    if let Some(path) = args.json.as_ref() {
        export::save_analysis_json(&analysis, path)?;
        eprintln!("Saved analysis to {}", path.display());
    }
    if let Some(path) = args.csv.as_ref() {
        export::save_table_csv(&analysis.table, path)?;
        eprintln!("Saved {} rows to {}", analysis.table.len(), path.display());
    }
    Ok(())
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            // Format up to 2 decimals, then trim trailing zeros and trailing dot.
            let s = format!("{:.2}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "no data".to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        Some(first) => first.to_uppercase().chain(c).collect(),
        None => String::new(),
    }
}

fn print_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let parts: Vec<String> = cells
        .zip(widths)
        .map(|(c, w)| format!(" {:<w$} ", c, w = *w))
        .collect();
    println!("|{}|", parts.join("|"));
}

/// Print rows as a left-aligned, `|`-separated grid.
fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let sep: String = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    println!("+{sep}+");
    print_row(headers.iter().copied(), &widths);
    println!("+{sep}+");
    for row in rows {
        print_row(row.iter().map(String::as_str), &widths);
    }
    println!("+{sep}+");
}

fn head<T>(items: &[T], n: usize) -> &[T] {
    if n == 0 { items } else { &items[..items.len().min(n)] }
}

fn print_characteristics(c: &Characteristics) {
    println!("-----------------------------");
    println!("{}", c.name.to_uppercase());
    println!("-----------------------------");
    println!("Types: {}", c.types.join(", "));
    println!("Abilities:");
    for a in &c.abilities {
        println!("  {}", capitalize(a));
    }
    println!("Stats:");
    for (stat, v) in &c.stats {
        println!("  {} - {}", capitalize(stat.as_str()), v);
    }
    match c.base_experience {
        Some(xp) => println!("Base experience: {xp}"),
        None => println!("Base experience: no data"),
    }
}

fn print_analysis(a: &Analysis, n: usize) {
    println!("\nPokémon per type (descending):");
    let rows: Vec<Vec<String>> = a
        .type_counts
        .iter()
        .map(|t| vec![t.type_name.clone(), t.count.to_string()])
        .collect();
    print_table(&["type", "count"], &rows);

    println!("\nAverage base experience per type:");
    let rows: Vec<Vec<String>> = a
        .type_experience
        .iter()
        .map(|t| {
            vec![
                t.type_name.clone(),
                t.total_experience.to_string(),
                t.eligible.to_string(),
                fmt_opt(t.average),
            ]
        })
        .collect();
    print_table(&["type", "base_experience", "eligible", "avg_base_exp"], &rows);
    match &a.highest_average_experience {
        Some(t) => println!("Highest average: {} ({})", t.type_name, fmt_opt(t.average)),
        None => println!("Highest average: no data"),
    }

    println!("\nDistinct abilities ({}):", a.distinct.abilities.len());
    let rows: Vec<Vec<String>> = head(&a.distinct.abilities, n)
        .iter()
        .map(|v| vec![v.value.clone(), v.count.to_string()])
        .collect();
    print_table(&["ability", "count"], &rows);
    println!("\nDistinct moves ({}):", a.distinct.moves.len());
    let rows: Vec<Vec<String>> = head(&a.distinct.moves, n)
        .iter()
        .map(|v| vec![v.value.clone(), v.count.to_string()])
        .collect();
    print_table(&["move", "count"], &rows);

    println!("\nMost common move per primary type:");
    let rows: Vec<Vec<String>> = a
        .common_moves
        .iter()
        .map(|m| {
            vec![
                m.primary_type.clone(),
                m.move_name.clone().unwrap_or_else(|| "no data".into()),
                m.count.to_string(),
            ]
        })
        .collect();
    print_table(&["primary_type", "move", "count"], &rows);
    println!("\nMove counts by primary type:");
    let rows: Vec<Vec<String>> = head(&a.primary_type_moves, n)
        .iter()
        .map(|m| vec![m.primary_type.clone(), m.move_name.clone(), m.count.to_string()])
        .collect();
    print_table(&["primary_type", "move", "count"], &rows);

    println!("\nTop 3 by total base stats per type:");
    let rows: Vec<Vec<String>> = a
        .top
        .iter()
        .map(|t| {
            let totals: Vec<String> = t.total_base_stats.iter().map(u64::to_string).collect();
            vec![t.type_name.clone(), t.ids.join(", "), totals.join(", ")]
        })
        .collect();
    print_table(&["type", "pokemon", "total_base_stats"], &rows);

    println!("\nMost diverse move sets among the top 3:");
    let rows: Vec<Vec<String>> = a
        .diversity
        .iter()
        .map(|d| vec![d.type_name.clone(), d.distinct_moves.to_string()])
        .collect();
    print_table(&["type", "distinct_moves_count"], &rows);
}
