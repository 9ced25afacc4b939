//! Inspection of debt left in cycles after pairwise netting.
//!
//! Pairwise netting only cancels 2-cycles. A ring such as `A→B→C→A` survives
//! it untouched even though it moves money in a circle. Nothing here alters
//! the transfer list; these functions only report how much longer cycles
//! still carry.

use crate::core::member::MemberId;
use crate::graph::debt_graph::DebtEdge;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A closed chain of transfers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtCycle {
    /// Ordered members; the last one owes the first.
    pub members: Vec<MemberId>,
    /// Smallest transfer along the cycle.
    pub bottleneck: Decimal,
}

impl DebtCycle {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Total transfer volume that collapsing this cycle would remove.
    pub fn potential_savings(&self) -> Decimal {
        self.bottleneck * Decimal::from(self.members.len())
    }
}

type Adjacency = BTreeMap<MemberId, Vec<(MemberId, Decimal)>>;

fn adjacency(transfers: &[DebtEdge]) -> Adjacency {
    let mut adj: Adjacency = BTreeMap::new();
    for t in transfers {
        if t.amount <= Decimal::ZERO {
            continue;
        }
        adj.entry(t.from.clone())
            .or_default()
            .push((t.to.clone(), t.amount));
        adj.entry(t.to.clone()).or_default();
    }
    adj
}

/// Find every simple cycle in a transfer list, largest savings first.
///
/// For each member, a DFS explores only members ordered after it, so every
/// cycle is reported once, starting at its smallest member.
pub fn find_residual_cycles(transfers: &[DebtEdge]) -> Vec<DebtCycle> {
    let adj = adjacency(transfers);
    let mut cycles = Vec::new();

    for start in adj.keys() {
        let mut path: Vec<MemberId> = Vec::new();
        let mut on_path: HashSet<MemberId> = HashSet::new();
        dfs(start, start, &adj, &mut path, &mut on_path, &mut cycles);
    }

    cycles.sort_by(|a, b| {
        b.potential_savings()
            .cmp(&a.potential_savings())
            .then_with(|| a.members.cmp(&b.members))
    });
    cycles
}

fn dfs(
    current: &MemberId,
    start: &MemberId,
    adj: &Adjacency,
    path: &mut Vec<MemberId>,
    on_path: &mut HashSet<MemberId>,
    cycles: &mut Vec<DebtCycle>,
) {
    path.push(current.clone());
    on_path.insert(current.clone());

    if let Some(neighbors) = adj.get(current) {
        for (next, _) in neighbors {
            if next == start && path.len() >= 2 {
                let bottleneck = bottleneck(path, adj);
                if bottleneck > Decimal::ZERO {
                    cycles.push(DebtCycle {
                        members: path.clone(),
                        bottleneck,
                    });
                }
            } else if next > start && !on_path.contains(next) {
                dfs(next, start, adj, path, on_path, cycles);
            }
        }
    }

    path.pop();
    on_path.remove(current);
}

fn bottleneck(members: &[MemberId], adj: &Adjacency) -> Decimal {
    let mut min = Decimal::MAX;
    for i in 0..members.len() {
        let from = &members[i];
        let to = &members[(i + 1) % members.len()];
        let amount = adj
            .get(from)
            .and_then(|edges| edges.iter().find(|(m, _)| m == to))
            .map(|(_, a)| *a)
            .unwrap_or(Decimal::ZERO);
        min = min.min(amount);
    }
    min
}

/// Groups of members that can all reach each other through transfers.
///
/// Only groups of two or more are returned; each is sorted, and the list is
/// sorted by its first member.
pub fn cyclic_components(transfers: &[DebtEdge]) -> Vec<Vec<MemberId>> {
    let mut graph: DiGraph<MemberId, Decimal> = DiGraph::new();
    let mut index: HashMap<MemberId, NodeIndex> = HashMap::new();

    let mut node = |graph: &mut DiGraph<MemberId, Decimal>, id: &MemberId| -> NodeIndex {
        *index
            .entry(id.clone())
            .or_insert_with(|| graph.add_node(id.clone()))
    };

    for t in transfers.iter().filter(|t| t.amount > Decimal::ZERO) {
        let from = node(&mut graph, &t.from);
        let to = node(&mut graph, &t.to);
        graph.add_edge(from, to, t.amount);
    }

    let mut components: Vec<Vec<MemberId>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|c| c.len() > 1)
        .map(|c| {
            let mut members: Vec<MemberId> = c.into_iter().map(|n| graph[n].clone()).collect();
            members.sort();
            members
        })
        .collect();
    components.sort();
    components
}
