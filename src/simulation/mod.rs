//! Synthetic groups for benchmarks and invariant tests.

pub mod generator;
