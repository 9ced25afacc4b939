//! Boundary with the external fact store.

pub mod memory;
pub mod ports;
