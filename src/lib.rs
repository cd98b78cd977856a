//! pokelab
//!
//! A small Rust library for retrieving Pokémon records from PokeAPI, normalizing them
//! into a flat table, and answering a fixed set of analytical questions over it.
//! Pairs with the `pokelab` CLI.
//!
//! ### Features
//! - Sequential fetch with retry and exponential backoff
//! - Schema validation of the nested API records at a single boundary
//! - Type counts, per-type average experience, distinct ability/move counts,
//!   most common move per primary type, top-3 by total base stats, move diversity
//! - Export the table as CSV and the full analysis as JSON
//!
//! ### Example
//! ```no_run
//! use pokelab::{Client, pipeline};
//!
//! let client = Client::default();
//! let analysis = pipeline::run(&client, 151);
//! analysis.require_records()?;
//! for row in &analysis.type_counts {
//!     println!("{} {}", row.type_name, row.count);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod export;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod select;
pub mod stats;

pub use api::{Client, FetchError, RetryPolicy};
pub use models::{PokemonRow, PokemonTable, Stat};
pub use normalize::{SchemaError, build_table, normalize};
pub use pipeline::Analysis;
