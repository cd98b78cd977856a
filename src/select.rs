//! Support for choosing a single Pokémon and summarising it.

use crate::models::{NamedResource, PokemonRow, Stat};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("index {index} is out of range, expected 0..{len}")]
    OutOfRange { index: usize, len: usize },
}

/// Validate `index` against a discovered listing.
pub fn select_index(
    listing: &[NamedResource],
    index: usize,
) -> Result<&NamedResource, SelectionError> {
    listing.get(index).ok_or(SelectionError::OutOfRange {
        index,
        len: listing.len(),
    })
}

/// Display summary of one row: types, abilities, stats and base experience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Characteristics {
    pub name: String,
    pub types: Vec<String>,
    pub abilities: Vec<String>,
    /// In the fixed stat order.
    pub stats: Vec<(Stat, u32)>,
    pub base_experience: Option<u32>,
}

impl From<&PokemonRow> for Characteristics {
    fn from(row: &PokemonRow) -> Self {
        Self {
            name: row.id.clone(),
            types: row.types.clone(),
            abilities: row.abilities.clone(),
            stats: row.base_stats.iter().map(|(s, v)| (*s, *v)).collect(),
            base_experience: row.base_experience,
        }
    }
}
