//! The raw debt graph and diagnostics over netted transfers.

pub mod cycles;
pub mod debt_graph;
