//! Validation and flattening of raw PokeAPI records into [`PokemonRow`]s.
//!
//! The nested JSON is decoded into the typed [`RawPokemon`] schema first, so that a
//! missing key fails here with a [`SchemaError`] instead of surfacing deep inside an
//! aggregation.

use crate::models::{PokemonRow, PokemonTable, RawPokemon, Stat};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("record does not match the expected schema: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("record has an empty name")]
    MissingId,
    #[error("{id}: record has no types")]
    NoTypes { id: String },
    #[error("{id}: expected at most 2 types, found {count}")]
    TooManyTypes { id: String, count: usize },
    #[error("{id}: type '{type_name}' listed twice")]
    DuplicateType { id: String, type_name: String },
    #[error("{id}: missing base stat '{stat}'")]
    MissingStat { id: String, stat: Stat },
    #[error("unknown base stat '{0}'")]
    UnknownStat(String),
    #[error("duplicate id '{0}' in table")]
    DuplicateId(String),
}

/// Non-fatal oddities found while normalizing a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SchemaWarning {
    /// The same stat appeared twice; the later value was kept.
    DuplicateStat {
        id: String,
        stat: Stat,
        previous: u32,
        kept: u32,
    },
}

impl std::fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaWarning::DuplicateStat {
                id,
                stat,
                previous,
                kept,
            } => write!(f, "{id}: stat '{stat}' listed twice ({previous} then {kept}), keeping {kept}"),
        }
    }
}

/// A normalized row together with any warnings raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub row: PokemonRow,
    pub warnings: Vec<SchemaWarning>,
}

/// A record that could not enter the table.
#[derive(Debug)]
pub struct Rejected {
    /// The id the record was requested under.
    pub key: String,
    pub error: SchemaError,
}

/// Result of [`build_table`]: the table plus every record that was skipped.
#[derive(Debug)]
pub struct TableBuild {
    pub table: PokemonTable,
    pub rejected: Vec<Rejected>,
}

/// Normalize one raw JSON record into a row, logging any warnings.
pub fn normalize(raw: &Value) -> Result<PokemonRow, SchemaError> {
    let raw: RawPokemon = RawPokemon::deserialize(raw)?;
    let Normalized { row, warnings } = normalize_record(raw)?;
    for w in &warnings {
        warn!("{w}");
    }
    Ok(row)
}

/// Normalize an already-decoded record.
pub fn normalize_record(raw: RawPokemon) -> Result<Normalized, SchemaError> {
    let id = raw.name.trim().to_string();
    if id.is_empty() {
        return Err(SchemaError::MissingId);
    }

    let types: Vec<String> = raw.types.into_iter().map(|t| t.kind.name).collect();
    let abilities: Vec<String> = raw.abilities.into_iter().map(|a| a.ability.name).collect();
    let moves: Vec<String> = raw.moves.into_iter().map(|m| m.move_ref.name).collect();

    let mut warnings = Vec::new();
    let mut base_stats = BTreeMap::new();
    for entry in raw.stats {
        let stat: Stat = entry.stat.name.parse()?;
        if let Some(previous) = base_stats.insert(stat, entry.base_stat) {
            warnings.push(SchemaWarning::DuplicateStat {
                id: id.clone(),
                stat,
                previous,
                kept: entry.base_stat,
            });
        }
    }

    let row = PokemonRow::new(id, types, raw.base_experience, abilities, moves, base_stats)?;
    Ok(Normalized { row, warnings })
}

/// Normalize every fetched record, skipping the ones that fail validation.
///
/// Row order follows the input map's order. A record whose name collides with an
/// earlier row is rejected with [`SchemaError::DuplicateId`].
pub fn build_table(records: &IndexMap<String, Value>) -> TableBuild {
    let mut rows = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (key, raw) in records {
        match normalize(raw) {
            Ok(row) if !seen.insert(row.id.clone()) => {
                warn!("skipping record '{key}': duplicate id '{}'", row.id);
                rejected.push(Rejected {
                    key: key.clone(),
                    error: SchemaError::DuplicateId(row.id),
                });
            }
            Ok(row) => {
                debug!("normalized '{key}' as '{}'", row.id);
                rows.push(row);
            }
            Err(error) => {
                warn!("skipping record '{key}': {error}");
                rejected.push(Rejected {
                    key: key.clone(),
                    error,
                });
            }
        }
    }

    TableBuild {
        table: PokemonTable::from_unique_rows(rows),
        rejected,
    }
}
