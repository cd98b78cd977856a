mod common;

use common::raw;
use indexmap::IndexMap;
use pokelab::normalize::{SchemaError, build_table};
use pokelab::{Stat, normalize};
use serde_json::{Value, json};

#[test]
fn flattens_nested_wrappers() {
    let rec = raw("charizard", &["fire", "flying"], Some(240), &["scratch", "ember", "scratch"], 534);
    let row = normalize(&rec).unwrap();

    assert_eq!(row.id, "charizard");
    assert_eq!(row.primary_type, "fire");
    assert_eq!(row.secondary_type.as_deref(), Some("flying"));
    assert_eq!(row.types, ["fire", "flying"]);
    assert_eq!(row.base_experience, Some(240));
    assert_eq!(row.abilities, ["overgrow"]);
    // duplicates survive normalization
    assert_eq!(row.moves, ["scratch", "ember", "scratch"]);
    assert_eq!(row.base_stats.len(), Stat::ALL.len());
    assert_eq!(row.total_base_stats(), 534);
}

#[test]
fn single_type_has_no_secondary() {
    let row = normalize(&raw("pikachu", &["electric"], Some(112), &[], 320)).unwrap();
    assert_eq!(row.types.len(), 1);
    assert_eq!(row.types[0], row.primary_type);
    assert!(row.secondary_type.is_none());
}

#[test]
fn normalization_is_deterministic() {
    let rec = raw("gengar", &["ghost", "poison"], Some(250), &["lick", "hypnosis"], 500);
    assert_eq!(normalize(&rec).unwrap(), normalize(&rec).unwrap());
}

#[test]
fn missing_experience_is_not_zero() {
    let mut rec = raw("missingno", &["normal"], None, &[], 100);
    assert_eq!(normalize(&rec).unwrap().base_experience, None);
    rec["base_experience"] = json!(0);
    assert_eq!(normalize(&rec).unwrap().base_experience, Some(0));
    rec.as_object_mut().unwrap().remove("base_experience");
    assert_eq!(normalize(&rec).unwrap().base_experience, None);
}

#[test]
fn type_count_is_validated() {
    let none = raw("x", &[], Some(1), &[], 10);
    assert!(matches!(normalize(&none), Err(SchemaError::NoTypes { .. })));

    let three = raw("x", &["fire", "water", "grass"], Some(1), &[], 10);
    assert!(matches!(
        normalize(&three),
        Err(SchemaError::TooManyTypes { count: 3, .. })
    ));

    let dup = raw("x", &["fire", "fire"], Some(1), &[], 10);
    assert!(matches!(normalize(&dup), Err(SchemaError::DuplicateType { .. })));
}

#[test]
fn missing_stat_is_an_error() {
    let mut rec = raw("x", &["fire"], Some(1), &[], 10);
    let stats = rec["stats"].as_array_mut().unwrap();
    stats.retain(|s| s["stat"]["name"] != "speed");
    assert!(matches!(
        normalize(&rec),
        Err(SchemaError::MissingStat { stat: Stat::Speed, .. })
    ));
}

#[test]
fn missing_required_keys_fail_at_the_boundary() {
    let mut rec = raw("x", &["fire"], Some(1), &[], 10);
    rec.as_object_mut().unwrap().remove("stats");
    assert!(matches!(normalize(&rec), Err(SchemaError::Decode(_))));

    let blank = raw("  ", &["fire"], Some(1), &[], 10);
    assert!(matches!(normalize(&blank), Err(SchemaError::MissingId)));

    assert!(matches!(normalize(&json!([1, 2])), Err(SchemaError::Decode(_))));
}

#[test]
fn build_table_keeps_every_clean_record() {
    let records: IndexMap<String, Value> = (1..=20)
        .map(|i| {
            let name = format!("mon-{i}");
            (i.to_string(), raw(&name, &["normal"], Some(i), &["tackle"], 100 + i))
        })
        .collect();
    let built = build_table(&records);
    assert!(built.rejected.is_empty());
    assert_eq!(built.table.len(), 20);
    let ids: std::collections::HashSet<&str> =
        built.table.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 20);
    // input order is kept
    assert_eq!(built.table.rows()[0].id, "mon-1");
    assert_eq!(built.table.rows()[19].id, "mon-20");
}

#[test]
fn build_table_skips_bad_and_duplicate_records() {
    let mut records: IndexMap<String, Value> = IndexMap::new();
    records.insert("1".into(), raw("bulbasaur", &["grass", "poison"], Some(64), &[], 318));
    records.insert("2".into(), raw("broken", &[], Some(1), &[], 10));
    records.insert("3".into(), raw("venusaur", &["grass"], Some(236), &[], 525));
    records.insert("bulbasaur".into(), raw("bulbasaur", &["grass"], Some(64), &[], 318));

    let built = build_table(&records);
    let ids: Vec<&str> = built.table.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["bulbasaur", "venusaur"]);

    let rejected: Vec<&str> = built.rejected.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(rejected, ["2", "bulbasaur"]);
    assert!(matches!(built.rejected[0].error, SchemaError::NoTypes { .. }));
    assert!(matches!(built.rejected[1].error, SchemaError::DuplicateId(ref id) if id == "bulbasaur"));
}

#[test]
fn empty_input_builds_empty_table() {
    let built = build_table(&IndexMap::new());
    assert!(built.table.is_empty());
    assert!(built.rejected.is_empty());
}
