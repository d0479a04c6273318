//! Storage layer for Phasegate - JSONL persistence for saga records and checkpoints.

mod jsonl;
mod traits;

pub use jsonl::JsonlStorage;
pub use traits::{Filter, FilterOp, HasId, Storage};
