//! Fixed analytical queries over a [`PokemonTable`].
//!
//! Every query borrows the table and returns a fresh `Vec` of plain records. Queries
//! that treat a list column as independent rows go through [`explode`], which builds a
//! borrowed view and leaves the table untouched.

use crate::models::{PokemonRow, PokemonTable};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Default number of leaders per type in [`top_by_total_stats`].
pub const TOP_K: usize = 3;

/// The list-valued columns of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListColumn {
    Types,
    Abilities,
    Moves,
}

impl ListColumn {
    pub fn of(self, row: &PokemonRow) -> &[String] {
        match self {
            ListColumn::Types => &row.types,
            ListColumn::Abilities => &row.abilities,
            ListColumn::Moves => &row.moves,
        }
    }
}

/// One element of an exploded list column together with the row it came from.
#[derive(Debug, Clone, Copy)]
pub struct Exploded<'a> {
    pub value: &'a str,
    pub row: &'a PokemonRow,
}

/// One output entry per list element, in table order. Rows with an empty list
/// contribute nothing.
pub fn explode(table: &PokemonTable, column: ListColumn) -> Vec<Exploded<'_>> {
    table
        .iter()
        .flat_map(|row| {
            column
                .of(row)
                .iter()
                .map(move |value| Exploded {
                    value: value.as_str(),
                    row,
                })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub type_name: String,
    pub count: usize,
}

/// Rows per type, most common first; ties by type name.
pub fn type_counts(table: &PokemonTable) -> Vec<TypeCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for e in explode(table, ListColumn::Types) {
        *counts.entry(e.value).or_default() += 1;
    }
    let mut out: Vec<TypeCount> = counts
        .into_iter()
        .map(|(t, count)| TypeCount {
            type_name: t.to_string(),
            count,
        })
        .collect();
    // stable: equal counts keep name order
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Base experience per type.
///
/// `average` is `None` when no row of the type reports a base experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeExperience {
    #[serde(rename = "type")]
    pub type_name: String,
    /// All rows carrying the type.
    pub count: usize,
    /// Rows carrying the type that have a base experience.
    pub eligible: usize,
    pub total_experience: u64,
    pub average: Option<f64>,
}

/// Mean base experience per type, in [`type_counts`] order.
///
/// A dual-typed row contributes to both of its types. Rows without a base experience
/// are left out of both the sum and the divisor.
pub fn type_experience(table: &PokemonTable) -> Vec<TypeExperience> {
    let mut acc: BTreeMap<&str, (usize, u64)> = BTreeMap::new();
    for e in explode(table, ListColumn::Types) {
        let slot = acc.entry(e.value).or_default();
        if let Some(xp) = e.row.base_experience {
            slot.0 += 1;
            slot.1 += u64::from(xp);
        }
    }

    type_counts(table)
        .into_iter()
        .map(|tc| {
            let (eligible, total) = acc.get(tc.type_name.as_str()).copied().unwrap_or((0, 0));
            let average = (eligible > 0).then(|| total as f64 / eligible as f64);
            TypeExperience {
                type_name: tc.type_name,
                count: tc.count,
                eligible,
                total_experience: total,
                average,
            }
        })
        .collect()
}

/// The type with the highest average experience. Types without data are ignored;
/// on equal averages the earlier entry wins.
pub fn highest_average_experience(rows: &[TypeExperience]) -> Option<&TypeExperience> {
    let mut best: Option<(&TypeExperience, f64)> = None;
    for row in rows {
        let Some(avg) = row.average else { continue };
        if best.is_none_or(|(_, b)| avg > b) {
            best = Some((row, avg));
        }
    }
    best.map(|(row, _)| row)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Occurrences of each distinct value in a list column, ordered by value.
pub fn value_counts(table: &PokemonTable, column: ListColumn) -> Vec<ValueCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for e in explode(table, column) {
        *counts.entry(e.value).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(v, count)| ValueCount {
            value: v.to_string(),
            count,
        })
        .collect()
}

pub fn ability_counts(table: &PokemonTable) -> Vec<ValueCount> {
    value_counts(table, ListColumn::Abilities)
}

pub fn move_counts(table: &PokemonTable) -> Vec<ValueCount> {
    value_counts(table, ListColumn::Moves)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinctCounts {
    pub abilities: Vec<ValueCount>,
    pub moves: Vec<ValueCount>,
}

pub fn distinct_counts(table: &PokemonTable) -> DistinctCounts {
    DistinctCounts {
        abilities: ability_counts(table),
        moves: move_counts(table),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMoveCount {
    pub primary_type: String,
    #[serde(rename = "move")]
    pub move_name: String,
    pub count: usize,
}

/// Move occurrences grouped by `(primary_type, move)`, sorted by primary type, then
/// count descending, then move name.
pub fn primary_type_move_counts(table: &PokemonTable) -> Vec<TypeMoveCount> {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for e in explode(table, ListColumn::Moves) {
        *counts.entry((e.row.primary_type.as_str(), e.value)).or_default() += 1;
    }
    let mut out: Vec<TypeMoveCount> = counts
        .into_iter()
        .map(|((t, m), count)| TypeMoveCount {
            primary_type: t.to_string(),
            move_name: m.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| {
        a.primary_type
            .cmp(&b.primary_type)
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a.move_name.cmp(&b.move_name))
    });
    out
}

/// Most frequent move for one primary type. `move_name` is `None` when no member of
/// the group knows any move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonMove {
    pub primary_type: String,
    #[serde(rename = "move")]
    pub move_name: Option<String>,
    pub count: usize,
}

/// One entry per distinct primary type, ordered by type name.
pub fn most_common_moves(table: &PokemonTable) -> Vec<CommonMove> {
    let mut winners: BTreeMap<String, TypeMoveCount> = BTreeMap::new();
    for row in primary_type_move_counts(table) {
        winners.entry(row.primary_type.clone()).or_insert(row);
    }

    let primaries: BTreeSet<&str> = table.iter().map(|r| r.primary_type.as_str()).collect();
    primaries
        .into_iter()
        .map(|t| match winners.remove(t) {
            Some(w) => CommonMove {
                primary_type: w.primary_type,
                move_name: Some(w.move_name),
                count: w.count,
            },
            None => CommonMove {
                primary_type: t.to_string(),
                move_name: None,
                count: 0,
            },
        })
        .collect()
}

/// Leaders of one type by total base stats. The three vectors are position-aligned;
/// `moves[i]` is the move list of `ids[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopEntities {
    #[serde(rename = "type")]
    pub type_name: String,
    pub ids: Vec<String>,
    pub moves: Vec<Vec<String>>,
    pub total_base_stats: Vec<u64>,
}

impl TopEntities {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Every move of every leader, in order, duplicates included.
    pub fn flattened_moves(&self) -> impl Iterator<Item = &str> {
        self.moves.iter().flatten().map(String::as_str)
    }
}

fn by_total_desc(a: &&PokemonRow, b: &&PokemonRow) -> Ordering {
    b.total_base_stats()
        .cmp(&a.total_base_stats())
        .then_with(|| a.id.cmp(&b.id))
}

/// For each type (by name), the `k` rows with the highest total base stats, ties by
/// id. Groups smaller than `k` are returned whole.
pub fn top_by_total_stats(table: &PokemonTable, k: usize) -> Vec<TopEntities> {
    let mut groups: BTreeMap<&str, Vec<&PokemonRow>> = BTreeMap::new();
    for e in explode(table, ListColumn::Types) {
        groups.entry(e.value).or_default().push(e.row);
    }

    groups
        .into_iter()
        .map(|(t, mut rows)| {
            rows.sort_by(by_total_desc);
            rows.truncate(k);
            TopEntities {
                type_name: t.to_string(),
                ids: rows.iter().map(|r| r.id.clone()).collect(),
                moves: rows.iter().map(|r| r.moves.clone()).collect(),
                total_base_stats: rows.iter().map(|r| r.total_base_stats()).collect(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDiversity {
    #[serde(rename = "type")]
    pub type_name: String,
    pub distinct_moves: usize,
}

/// Size of the union of the leaders' move lists per type, most diverse first; ties by
/// type name.
pub fn move_diversity(top: &[TopEntities]) -> Vec<MoveDiversity> {
    let mut out: Vec<MoveDiversity> = top
        .iter()
        .map(|t| MoveDiversity {
            type_name: t.type_name.clone(),
            distinct_moves: t.flattened_moves().collect::<BTreeSet<_>>().len(),
        })
        .collect();
    out.sort_by(|a, b| {
        b.distinct_moves
            .cmp(&a.distinct_moves)
            .then_with(|| a.type_name.cmp(&b.type_name))
    });
    out
}
