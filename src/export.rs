use crate::models::{PokemonTable, Stat};
use crate::pipeline::Analysis;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix cells that a spreadsheet would evaluate as a formula.
fn guard(cell: &str) -> Cow<'_, str> {
    if cell.starts_with(['=', '+', '-', '@']) {
        Cow::Owned(format!("'{cell}"))
    } else {
        Cow::Borrowed(cell)
    }
}

/// Save the table as CSV with header. List columns are joined with `;`.
pub fn save_table_csv<P: AsRef<Path>>(table: &PokemonTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;

    let mut header = vec![
        "id",
        "primary_type",
        "secondary_type",
        "base_experience",
        "abilities",
        "moves",
    ];
    header.extend(Stat::ALL.iter().map(|s| s.as_str()));
    header.push("total_base_stats");
    wtr.write_record(&header)?;

    for row in table {
        let mut rec: Vec<String> = vec![
            guard(&row.id).into_owned(),
            guard(&row.primary_type).into_owned(),
            row.secondary_type.as_deref().map(guard).unwrap_or_default().into_owned(),
            row.base_experience.map(|x| x.to_string()).unwrap_or_default(),
            guard(&row.abilities.join(";")).into_owned(),
            guard(&row.moves.join(";")).into_owned(),
        ];
        rec.extend(Stat::ALL.iter().map(|s| {
            row.base_stats.get(s).map(u32::to_string).unwrap_or_default()
        }));
        rec.push(row.total_base_stats().to_string());
        wtr.write_record(&rec)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save the whole analysis as pretty JSON.
pub fn save_analysis_json<P: AsRef<Path>>(analysis: &Analysis, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let s = serde_json::to_string_pretty(analysis)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
