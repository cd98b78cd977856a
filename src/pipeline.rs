//! Fetch → normalize → aggregate, end to end.

use crate::api::{Client, FetchBatch, Transport};
use crate::models::PokemonTable;
use crate::normalize::build_table;
use crate::stats::{self, CommonMove, DistinctCounts, MoveDiversity, TopEntities, TypeCount};
use crate::stats::{TypeExperience, TypeMoveCount};
use log::{error, info};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("remote source unreachable: none of {attempted} records could be fetched")]
    SourceUnreachable { attempted: usize },
    #[error("no usable records: all {rejected} fetched records failed validation")]
    NoUsableRecords { rejected: usize },
}

/// What happened on the way to the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub requested: usize,
    pub fetched: usize,
    pub retries: u32,
    pub failed_ids: Vec<String>,
    pub rejected_ids: Vec<String>,
}

/// The table and every query result computed from it.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub table: PokemonTable,
    pub type_counts: Vec<TypeCount>,
    pub type_experience: Vec<TypeExperience>,
    pub highest_average_experience: Option<TypeExperience>,
    pub distinct: DistinctCounts,
    pub primary_type_moves: Vec<TypeMoveCount>,
    pub common_moves: Vec<CommonMove>,
    pub top: Vec<TopEntities>,
    pub diversity: Vec<MoveDiversity>,
    pub diagnostics: Diagnostics,
}

impl Analysis {
    /// Run every query over `table`.
    pub fn from_table(table: PokemonTable) -> Self {
        let type_experience = stats::type_experience(&table);
        let highest_average_experience =
            stats::highest_average_experience(&type_experience).cloned();
        let top = stats::top_by_total_stats(&table, stats::TOP_K);
        let diversity = stats::move_diversity(&top);
        Self {
            type_counts: stats::type_counts(&table),
            type_experience,
            highest_average_experience,
            distinct: stats::distinct_counts(&table),
            primary_type_moves: stats::primary_type_move_counts(&table),
            common_moves: stats::most_common_moves(&table),
            top,
            diversity,
            diagnostics: Diagnostics {
                requested: table.len(),
                fetched: table.len(),
                ..Diagnostics::default()
            },
            table,
        }
    }

    /// Normalize a fetched batch and analyze it.
    pub fn from_batch(batch: &FetchBatch) -> Self {
        let built = build_table(&batch.records);
        let mut analysis = Self::from_table(built.table);
        analysis.diagnostics = Diagnostics {
            requested: batch.attempted(),
            fetched: batch.records.len(),
            retries: batch.retries,
            failed_ids: batch.failed.iter().map(|f| f.id.clone()).collect(),
            rejected_ids: built.rejected.into_iter().map(|r| r.key).collect(),
        };
        analysis
    }

    /// Fail when records were requested but the table came out empty, either because
    /// nothing could be fetched or because every fetched record was rejected.
    pub fn require_records(&self) -> Result<&Self, PipelineError> {
        let d = &self.diagnostics;
        if d.requested > 0 && d.fetched == 0 {
            return Err(PipelineError::SourceUnreachable {
                attempted: d.requested,
            });
        }
        if d.requested > 0 && self.table.is_empty() {
            return Err(PipelineError::NoUsableRecords {
                rejected: d.rejected_ids.len(),
            });
        }
        Ok(self)
    }
}

/// Ids `1..=limit`, the numbering the remote source uses.
pub fn pokemon_ids(limit: u32) -> Vec<String> {
    (1..=limit).map(|n| n.to_string()).collect()
}

/// Fetch the first `limit` records and analyze them.
pub fn run<T: Transport>(client: &Client<T>, limit: u32) -> Analysis {
    run_ids(client, &pokemon_ids(limit))
}

/// Fetch the given ids and analyze whatever arrived.
pub fn run_ids<T: Transport, S: AsRef<str>>(client: &Client<T>, ids: &[S]) -> Analysis {
    let batch = client.fetch_all(ids);
    let analysis = Analysis::from_batch(&batch);
    let d = &analysis.diagnostics;
    info!(
        "table built: {} rows ({} fetched, {} failed, {} rejected, {} retries)",
        analysis.table.len(),
        d.fetched,
        d.failed_ids.len(),
        d.rejected_ids.len(),
        d.retries
    );
    if d.requested > 0 && d.fetched == 0 {
        error!("no records obtained; continuing with an empty table");
    } else if d.requested > 0 && analysis.table.is_empty() {
        error!("every fetched record was rejected; continuing with an empty table");
    }
    analysis
}
