use crate::normalize::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// `{name, url}` reference used throughout PokeAPI payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Listing page returned by `GET /pokemon/?limit=N`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceList {
    #[serde(default)]
    pub count: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<NamedResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSlot {
    #[serde(default)]
    pub slot: u8,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedResource,
    #[serde(default)]
    pub is_hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveEntry {
    #[serde(rename = "move")]
    pub move_ref: NamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatEntry {
    pub base_stat: u32,
    pub stat: NamedResource,
}

/// Raw record from `GET /pokemon/{id}`, restricted to the fields the table needs.
///
/// `types` and `stats` are required; `abilities` and `moves` default to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPokemon {
    pub name: String,
    pub base_experience: Option<u32>,
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub moves: Vec<MoveEntry>,
    pub stats: Vec<StatEntry>,
}

/// The fixed base-stat vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stat {
    Hp,
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
}

impl Stat {
    pub const ALL: [Stat; 6] = [
        Stat::Hp,
        Stat::Attack,
        Stat::Defense,
        Stat::SpecialAttack,
        Stat::SpecialDefense,
        Stat::Speed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::Hp => "hp",
            Stat::Attack => "attack",
            Stat::Defense => "defense",
            Stat::SpecialAttack => "special-attack",
            Stat::SpecialDefense => "special-defense",
            Stat::Speed => "speed",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stat {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stat::ALL
            .into_iter()
            .find(|stat| stat.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownStat(s.to_string()))
    }
}

/// One normalized Pokémon (one row of the table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PokemonRow {
    pub id: String,
    pub primary_type: String,
    pub secondary_type: Option<String>,
    pub types: Vec<String>,
    pub base_experience: Option<u32>,
    pub abilities: Vec<String>,
    pub moves: Vec<String>,
    pub base_stats: BTreeMap<Stat, u32>,
}

impl PokemonRow {
    /// Build a row, enforcing the type and stat invariants.
    ///
    /// `types` must hold one or two distinct names, and `base_stats` must cover
    /// every [`Stat`].
    pub fn new(
        id: impl Into<String>,
        types: Vec<String>,
        base_experience: Option<u32>,
        abilities: Vec<String>,
        moves: Vec<String>,
        base_stats: BTreeMap<Stat, u32>,
    ) -> Result<Self, SchemaError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SchemaError::MissingId);
        }
        match types.len() {
            0 => return Err(SchemaError::NoTypes { id }),
            1 | 2 => {}
            n => return Err(SchemaError::TooManyTypes { id, count: n }),
        }
        if types.len() == 2 && types[0] == types[1] {
            return Err(SchemaError::DuplicateType {
                id,
                type_name: types[0].clone(),
            });
        }
        if let Some(stat) = Stat::ALL.into_iter().find(|s| !base_stats.contains_key(s)) {
            return Err(SchemaError::MissingStat { id, stat });
        }

        Ok(Self {
            primary_type: types[0].clone(),
            secondary_type: types.get(1).cloned(),
            id,
            types,
            base_experience,
            abilities,
            moves,
            base_stats,
        })
    }

    /// Sum of all base stats, widened so six `u32` values cannot overflow.
    pub fn total_base_stats(&self) -> u64 {
        self.base_stats.values().map(|&v| u64::from(v)).sum()
    }

    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.iter().any(|t| t == type_name)
    }
}

/// The canonical table: ordered rows with unique ids, read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PokemonTable {
    rows: Vec<PokemonRow>,
}

impl PokemonTable {
    /// Build a table from rows, rejecting duplicate ids.
    pub fn from_rows(rows: Vec<PokemonRow>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for row in &rows {
            if !seen.insert(row.id.as_str()) {
                return Err(SchemaError::DuplicateId(row.id.clone()));
            }
        }
        Ok(Self { rows })
    }

    /// Caller guarantees ids are unique.
    pub(crate) fn from_unique_rows(rows: Vec<PokemonRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PokemonRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PokemonRow> {
        self.rows.iter()
    }

    pub fn get(&self, id: &str) -> Option<&PokemonRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> IntoIterator for &'a PokemonTable {
    type Item = &'a PokemonRow;
    type IntoIter = std::slice::Iter<'a, PokemonRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
