mod common;

use common::{abc_table, row};
use pokelab::pipeline::Analysis;
use pokelab::{PokemonTable, export};
use std::fs;
use tempfile::tempdir;

#[test]
fn save_table_csv_flattens_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("table.csv");
    export::save_table_csv(&abc_table(), &path).unwrap();

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        [
            "id",
            "primary_type",
            "secondary_type",
            "base_experience",
            "abilities",
            "moves",
            "hp",
            "attack",
            "defense",
            "special-attack",
            "special-defense",
            "speed",
            "total_base_stats"
        ]
    );
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[1][0], "B");
    assert_eq!(&rows[1][2], "flying");
    assert_eq!(&rows[1][3], "");
    assert_eq!(&rows[1][5], "ember;gust");
    assert_eq!(&rows[1][12], "250");
}

//test that cells which a spreadsheet would evaluate as formulas get a leading quote
#[test]
fn csv_cells_are_prefixed_to_avoid_formulas() {
    let table = PokemonTable::from_rows(vec![row(
        "=HYPERLINK(\"http://evil\")",
        &["+fire"],
        Some(1),
        &["@foo"],
        &["-move"],
        10,
    )])
    .unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("evil.csv");
    export::save_table_csv(&table, &path).unwrap();

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let row = rdr.records().next().expect("one data row expected").unwrap();
    for (idx, needle) in [(0, "=HYPERLINK"), (1, "+fire"), (4, "@foo"), (5, "-move")] {
        let cell = &row[idx];
        assert!(cell.starts_with('\''), "cell {idx} not prefixed: {cell}");
        assert!(cell.contains(needle), "cell {idx} content changed: {cell}");
    }
}

#[test]
fn save_analysis_json_round_trips_as_value() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("analysis.json");
    export::save_analysis_json(&Analysis::from_table(abc_table()), &path).unwrap();
    let txt = fs::read_to_string(&path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&txt).unwrap();
    assert_eq!(v["table"].as_array().unwrap().len(), 3);
    assert_eq!(v["highest_average_experience"]["type"], "fire");
}

#[test]
fn save_fails_for_missing_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no/such/dir/table.csv");
    assert!(export::save_table_csv(&abc_table(), &path).is_err());
}
