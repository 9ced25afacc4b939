use crate::core::expense::Expense;
use crate::core::member::MemberId;
use crate::core::settlement::Settlement;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A directed amount owed by `from` to `to`.
///
/// In netted form the amount is always strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DebtEdge {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Decimal,
}

impl DebtEdge {
    pub fn new(from: MemberId, to: MemberId, amount: Decimal) -> Self {
        Self { from, to, amount }
    }
}

impl fmt::Display for DebtEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}: {}", self.from, self.to, self.amount)
    }
}

/// Accumulated one-directional debt between members, before netting.
///
/// Keys are `(debtor, creditor)`. Values may be zero or negative: a
/// negative edge means the debtor has paid more than the shares they owed
/// in that direction. Trimming happens in the netter.
///
/// Backed by ordered maps, so two graphs built from the same facts compare
/// equal regardless of the order the facts were fed in.
///
/// # Examples
///
/// ```
/// use expense_ledger::graph::debt_graph::RawDebtGraph;
/// use expense_ledger::core::member::MemberId;
/// use rust_decimal_macros::dec;
///
/// let (a, b) = (MemberId::new("a"), MemberId::new("b"));
/// let mut graph = RawDebtGraph::new();
/// graph.add_debt(&a, &b, dec!(50));
/// graph.reduce_debt(&a, &b, dec!(20));
///
/// assert_eq!(graph.edge_amount(&a, &b), dec!(30));
/// assert_eq!(graph.edge_amount(&b, &a), dec!(0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDebtGraph {
    members: BTreeSet<MemberId>,
    #[serde(with = "edges_serde")]
    edges: BTreeMap<(MemberId, MemberId), Decimal>,
}

mod edges_serde {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        edges: &BTreeMap<(MemberId, MemberId), Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let list: Vec<DebtEdge> = edges
            .iter()
            .map(|((from, to), amount)| DebtEdge::new(from.clone(), to.clone(), *amount))
            .collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<(MemberId, MemberId), Decimal>, D::Error> {
        let list = Vec::<DebtEdge>::deserialize(deserializer)?;
        let mut edges = BTreeMap::new();
        for edge in list {
            *edges.entry((edge.from, edge.to)).or_insert(Decimal::ZERO) += edge.amount;
        }
        Ok(edges)
    }
}

impl RawDebtGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member so it is representable even with no debt at all.
    pub fn add_member(&mut self, member: MemberId) {
        self.members.insert(member);
    }

    /// `debtor` owes `creditor` an additional `amount`.
    pub fn add_debt(&mut self, debtor: &MemberId, creditor: &MemberId, amount: Decimal) {
        self.members.insert(debtor.clone());
        self.members.insert(creditor.clone());
        *self
            .edges
            .entry((debtor.clone(), creditor.clone()))
            .or_insert(Decimal::ZERO) += amount;
    }

    /// `debtor` paid `creditor` `amount` out of band. May drive the edge negative.
    pub fn reduce_debt(&mut self, debtor: &MemberId, creditor: &MemberId, amount: Decimal) {
        self.add_debt(debtor, creditor, -amount);
    }

    /// Build a graph from a list of edges, summing duplicates.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a DebtEdge>) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_debt(&edge.from, &edge.to, edge.amount);
        }
        graph
    }

    /// Raw amount `debtor` owes `creditor`, zero when no edge was recorded.
    pub fn edge_amount(&self, debtor: &MemberId, creditor: &MemberId) -> Decimal {
        self.edges
            .get(&(debtor.clone(), creditor.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// All recorded edges as `(debtor, creditor, amount)`, in key order.
    pub fn edges(&self) -> impl Iterator<Item = (&MemberId, &MemberId, Decimal)> {
        self.edges.iter().map(|((d, c), &amt)| (d, c, amt))
    }

    pub fn members(&self) -> &BTreeSet<MemberId> {
        &self.members
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Unordered member pairs that have at least one recorded edge.
    pub fn pairs(&self) -> BTreeSet<(&MemberId, &MemberId)> {
        self.edges
            .keys()
            .map(|(d, c)| if d <= c { (d, c) } else { (c, d) })
            .collect()
    }
}

/// Folds expense shares and settlements into a [`RawDebtGraph`].
pub struct LedgerAggregator;

impl LedgerAggregator {
    /// Build the raw debt graph for one group snapshot.
    ///
    /// # Algorithm
    ///
    /// 1. Register every roster member.
    /// 2. For every unsettled share not belonging to the payer, add the
    ///    share amount to `member → payer`.
    /// 3. For every settlement, subtract its amount from `from → to`.
    ///
    /// Recomputed from the full fact set on every call; accumulation is a
    /// commutative sum so enumeration order does not matter.
    pub fn aggregate<'a>(
        members: impl IntoIterator<Item = &'a MemberId>,
        expenses: &[Expense],
        settlements: &[Settlement],
    ) -> RawDebtGraph {
        let mut graph = RawDebtGraph::new();
        for member in members {
            graph.add_member(member.clone());
        }

        let mut share_count = 0usize;
        for expense in expenses {
            for share in expense.debtors() {
                graph.add_debt(&share.member, expense.paid_by(), share.amount);
                share_count += 1;
            }
        }

        for settlement in settlements {
            graph.reduce_debt(settlement.from(), settlement.to(), settlement.amount());
        }

        debug!(
            "aggregated {} shares and {} settlements into {} raw edges over {} members",
            share_count,
            settlements.len(),
            graph.edge_count(),
            graph.member_count()
        );
        graph
    }
}
