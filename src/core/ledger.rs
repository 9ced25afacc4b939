use crate::core::member::MemberId;
use crate::graph::debt_graph::DebtEdge;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One member's aggregate figures over the netted transfer list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// What this member owes others.
    pub total_owed: Decimal,
    /// What others owe this member.
    pub total_owing: Decimal,
}

impl Position {
    /// Positive means the group owes this member, negative means they owe the group.
    pub fn net_balance(&self) -> Decimal {
        self.total_owing - self.total_owed
    }

    pub fn is_flat(&self) -> bool {
        self.total_owed.is_zero() && self.total_owing.is_zero()
    }
}

/// Per-member positions accumulated from netted transfers.
///
/// The ledger is balanced when every unit owed has a matching unit owing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    positions: BTreeMap<MemberId, Position>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member with a zero position if it is not present yet.
    pub fn open(&mut self, member: &MemberId) {
        self.positions.entry(member.clone()).or_default();
    }

    /// Apply a transfer: the debtor owes more, the creditor is owed more.
    pub fn apply_transfer(&mut self, transfer: &DebtEdge) {
        self.positions
            .entry(transfer.from.clone())
            .or_default()
            .total_owed += transfer.amount;
        self.positions
            .entry(transfer.to.clone())
            .or_default()
            .total_owing += transfer.amount;
    }

    /// Position of a member; zero when the member never appeared.
    pub fn position(&self, member: &MemberId) -> Position {
        self.positions.get(member).copied().unwrap_or_default()
    }

    pub fn positions(&self) -> &BTreeMap<MemberId, Position> {
        &self.positions
    }

    pub fn total_owed(&self) -> Decimal {
        self.positions.values().map(|p| p.total_owed).sum()
    }

    pub fn total_owing(&self) -> Decimal {
        self.positions.values().map(|p| p.total_owing).sum()
    }

    /// Conservation check: Σ owed == Σ owing and Σ net == 0.
    pub fn is_balanced(&self) -> bool {
        let net: Decimal = self.positions.values().map(|p| p.net_balance()).sum();
        self.total_owed() == self.total_owing() && net.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn edge(from: &str, to: &str, amount: Decimal) -> DebtEdge {
        DebtEdge::new(MemberId::new(from), MemberId::new(to), amount)
    }

    #[test]
    fn test_ledger_basic() {
        let mut ledger = Ledger::new();
        ledger.apply_transfer(&edge("a", "b", dec!(100)));

        let a = ledger.position(&MemberId::new("a"));
        let b = ledger.position(&MemberId::new("b"));
        assert_eq!(a.total_owed, dec!(100));
        assert_eq!(a.net_balance(), dec!(-100));
        assert_eq!(b.total_owing, dec!(100));
        assert_eq!(b.net_balance(), dec!(100));
        assert!(ledger.is_balanced());
    }

    #[test]
    fn test_ledger_chain_nets_middle_member() {
        let mut ledger = Ledger::new();
        ledger.apply_transfer(&edge("a", "b", dec!(40)));
        ledger.apply_transfer(&edge("b", "c", dec!(40)));

        let b = ledger.position(&MemberId::new("b"));
        assert_eq!(b.total_owed, dec!(40));
        assert_eq!(b.total_owing, dec!(40));
        assert_eq!(b.net_balance(), Decimal::ZERO);
        assert!(ledger.is_balanced());
    }

    #[test]
    fn test_unknown_member_is_flat() {
        let mut ledger = Ledger::new();
        ledger.open(&MemberId::new("z"));
        assert!(ledger.position(&MemberId::new("z")).is_flat());
        assert!(ledger.position(&MemberId::new("nobody")).is_flat());
        assert_eq!(ledger.positions().len(), 1);
    }
}
