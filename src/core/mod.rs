//! Foundational types: members, expenses, settlements, money and errors.

pub mod config;
pub mod error;
pub mod expense;
pub mod ledger;
pub mod member;
pub mod money;
pub mod settlement;
