//! Pairwise netting and per-member balance summaries.

pub mod netting;
pub mod summary;
