//! Turning one expense into per-member shares.

pub mod calculator;
pub mod strategy;
