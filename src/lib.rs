//! # expense-ledger
//!
//! Group expense splitting and debt-netting engine.
//!
//! Given a group's roster, its expenses and the settlements recorded so far,
//! this engine computes who owes whom and how much.
//!
//! ## Architecture
//!
//! - **core**: Members, expenses, settlements, money helpers and errors
//! - **split**: Turning one expense into per-member shares
//! - **graph**: Raw debt graph aggregation and residual cycle diagnostics
//! - **optimization**: Pairwise netting and per-member balance summaries
//! - **feed**: Ports to the external fact store, plus an in-memory store
//! - **service**: Balance queries and fact recording over a store
//! - **simulation**: Random group generation for tests and benchmarks

pub mod core;
pub mod feed;
pub mod graph;
pub mod optimization;
pub mod service;
pub mod simulation;
pub mod split;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::config::LedgerConfig;
    pub use crate::core::error::{FeedError, InvalidSplit, LedgerError, ValidationError};
    pub use crate::core::expense::{Expense, ExpenseShare};
    pub use crate::core::member::{GroupId, Member, MemberId};
    pub use crate::core::settlement::Settlement;
    pub use crate::feed::memory::InMemoryFacts;
    pub use crate::feed::ports::{FactFeed, FactSink, GroupSnapshot, MemberDirectory};
    pub use crate::graph::debt_graph::{DebtEdge, LedgerAggregator, RawDebtGraph};
    pub use crate::optimization::netting::{DebtNetter, NettingResult};
    pub use crate::optimization::summary::{
        BalanceSummarizer, GroupBalanceSummary, MemberBalanceSummary,
    };
    pub use crate::service::{calculate_balances, LedgerService};
    pub use crate::split::calculator::compute_splits;
    pub use crate::split::strategy::{SplitInput, SplitStrategy};
}
