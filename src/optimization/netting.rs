use crate::graph::debt_graph::{DebtEdge, RawDebtGraph};
use crate::core::member::MemberId;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of netting the two directions between one pair of members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairNetting {
    pub member_a: MemberId,
    pub member_b: MemberId,
    /// Raw amount A owes B.
    pub a_to_b: Decimal,
    /// Raw amount B owes A.
    pub b_to_a: Decimal,
    /// Positive means A owes B net, negative means B owes A net.
    pub net_amount: Decimal,
}

impl PairNetting {
    /// The single surviving transfer, or `None` if the pair is balanced
    /// within `epsilon`.
    pub fn transfer(&self, epsilon: Decimal) -> Option<DebtEdge> {
        if self.net_amount > epsilon {
            Some(DebtEdge::new(
                self.member_a.clone(),
                self.member_b.clone(),
                self.net_amount,
            ))
        } else if self.net_amount < -epsilon {
            Some(DebtEdge::new(
                self.member_b.clone(),
                self.member_a.clone(),
                -self.net_amount,
            ))
        } else {
            None
        }
    }
}

/// Outcome of netting a whole raw debt graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NettingResult {
    transfers: Vec<DebtEdge>,
    gross_total: Decimal,
    net_total: Decimal,
}

impl NettingResult {
    /// Netted transfers sorted by `(from, to)`.
    pub fn transfers(&self) -> &[DebtEdge] {
        &self.transfers
    }

    pub fn into_transfers(self) -> Vec<DebtEdge> {
        self.transfers
    }

    /// Sum of all positive raw edges before netting.
    pub fn gross_total(&self) -> Decimal {
        self.gross_total
    }

    /// Sum of all netted transfers.
    pub fn net_total(&self) -> Decimal {
        self.net_total
    }

    /// Amount that no longer needs to move thanks to reciprocal cancellation.
    pub fn savings(&self) -> Decimal {
        (self.gross_total - self.net_total).max(Decimal::ZERO)
    }
}

/// Pairwise debt netting.
///
/// For each unordered pair `{A, B}` with raw edges `A→B = x` and `B→A = y`
/// at most one transfer survives: `A→B = x - y` or `B→A = y - x`, or none
/// when `|x - y| <= epsilon`.
///
/// Only 2-cycles are cancelled. A longer cycle such as `A→B→C→A` is left
/// in place; see [`crate::graph::cycles`] for inspecting what remains.
pub struct DebtNetter;

impl DebtNetter {
    /// Net the two directions between `a` and `b`.
    ///
    /// If A owes B 100 and B owes A 60, the net obligation is A owes B 40.
    pub fn net_pair(graph: &RawDebtGraph, a: &MemberId, b: &MemberId) -> PairNetting {
        let a_to_b = graph.edge_amount(a, b);
        let b_to_a = graph.edge_amount(b, a);
        PairNetting {
            member_a: a.clone(),
            member_b: b.clone(),
            a_to_b,
            b_to_a,
            net_amount: a_to_b - b_to_a,
        }
    }

    /// Net every pair of a raw debt graph.
    pub fn net(graph: &RawDebtGraph, epsilon: Decimal) -> NettingResult {
        let gross_total: Decimal = graph
            .edges()
            .map(|(_, _, amount)| amount)
            .filter(|amount| *amount > Decimal::ZERO)
            .sum();

        let mut transfers: Vec<DebtEdge> = graph
            .pairs()
            .into_iter()
            .filter_map(|(a, b)| Self::net_pair(graph, a, b).transfer(epsilon))
            .collect();
        transfers.sort_by(|x, y| (&x.from, &x.to).cmp(&(&y.from, &y.to)));

        let net_total = transfers.iter().map(|t| t.amount).sum();
        debug!(
            "netted {} raw edges into {} transfers (gross {}, net {})",
            graph.edge_count(),
            transfers.len(),
            gross_total,
            net_total
        );

        NettingResult {
            transfers,
            gross_total,
            net_total,
        }
    }

    /// Net a plain edge list. Applying this to its own output returns the
    /// same list.
    pub fn net_edges(edges: &[DebtEdge], epsilon: Decimal) -> Vec<DebtEdge> {
        Self::net(&RawDebtGraph::from_edges(edges), epsilon).into_transfers()
    }
}

impl std::fmt::Display for NettingResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Netting Result ===")?;
        writeln!(f, "Gross Total:    {}", self.gross_total)?;
        writeln!(f, "Net Total:      {}", self.net_total)?;
        writeln!(f, "Savings:        {}", self.savings())?;
        writeln!(f, "Transfers:      {}", self.transfers.len())?;
        for transfer in &self.transfers {
            writeln!(f, "  {}", transfer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn m(id: &str) -> MemberId {
        MemberId::new(id)
    }

    fn eps() -> Decimal {
        dec!(0.01)
    }

    #[test]
    fn test_pair_netting() {
        let mut graph = RawDebtGraph::new();
        graph.add_debt(&m("a"), &m("b"), dec!(100));
        graph.add_debt(&m("b"), &m("a"), dec!(60));

        let pair = DebtNetter::net_pair(&graph, &m("a"), &m("b"));
        assert_eq!(pair.a_to_b, dec!(100));
        assert_eq!(pair.b_to_a, dec!(60));
        assert_eq!(pair.net_amount, dec!(40));
        assert_eq!(
            pair.transfer(eps()),
            Some(DebtEdge::new(m("a"), m("b"), dec!(40)))
        );

        let result = DebtNetter::net(&graph, eps());
        assert_eq!(result.gross_total(), dec!(160));
        assert_eq!(result.net_total(), dec!(40));
        assert_eq!(result.savings(), dec!(120));
    }

    #[test]
    fn test_reverse_direction_wins() {
        let mut graph = RawDebtGraph::new();
        graph.add_debt(&m("a"), &m("b"), dec!(10));
        graph.add_debt(&m("b"), &m("a"), dec!(35));
        let transfers = DebtNetter::net(&graph, eps()).into_transfers();
        assert_eq!(transfers, vec![DebtEdge::new(m("b"), m("a"), dec!(25))]);
    }

    #[test]
    fn test_balanced_pair_dropped() {
        let mut graph = RawDebtGraph::new();
        graph.add_debt(&m("a"), &m("b"), dec!(50));
        graph.add_debt(&m("b"), &m("a"), dec!(49.995));
        assert!(DebtNetter::net(&graph, eps()).transfers().is_empty());
    }

    #[test]
    fn test_negative_raw_edge_flips_direction() {
        // a overpaid b by 15 and owes nothing else
        let mut graph = RawDebtGraph::new();
        graph.add_debt(&m("a"), &m("b"), dec!(-15));
        let transfers = DebtNetter::net(&graph, eps()).into_transfers();
        assert_eq!(transfers, vec![DebtEdge::new(m("b"), m("a"), dec!(15))]);
    }

    #[test]
    fn test_cycle_is_not_collapsed() {
        let mut graph = RawDebtGraph::new();
        graph.add_debt(&m("a"), &m("b"), dec!(100));
        graph.add_debt(&m("b"), &m("c"), dec!(100));
        graph.add_debt(&m("c"), &m("a"), dec!(100));
        let result = DebtNetter::net(&graph, eps());
        assert_eq!(result.transfers().len(), 3);
        assert_eq!(result.net_total(), dec!(300));
    }

    #[test]
    fn test_netting_is_idempotent() {
        let mut graph = RawDebtGraph::new();
        graph.add_debt(&m("a"), &m("b"), dec!(70));
        graph.add_debt(&m("b"), &m("a"), dec!(20));
        graph.add_debt(&m("c"), &m("a"), dec!(12.5));
        graph.add_debt(&m("b"), &m("c"), dec!(3));

        let once = DebtNetter::net(&graph, eps()).into_transfers();
        let twice = DebtNetter::net_edges(&once, eps());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_transfers_sorted() {
        let mut graph = RawDebtGraph::new();
        graph.add_debt(&m("c"), &m("a"), dec!(1));
        graph.add_debt(&m("a"), &m("b"), dec!(1));
        let transfers = DebtNetter::net(&graph, eps()).into_transfers();
        assert_eq!(transfers[0].from, m("a"));
        assert_eq!(transfers[1].from, m("c"));
    }

    #[test]
    fn test_empty_graph() {
        let result = DebtNetter::net(&RawDebtGraph::new(), eps());
        assert!(result.transfers().is_empty());
        assert_eq!(result.gross_total(), Decimal::ZERO);
        assert_eq!(result.net_total(), Decimal::ZERO);
    }
}
