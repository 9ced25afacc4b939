use crate::core::ledger::Ledger;
use crate::core::member::{GroupId, Member, MemberId};
use crate::graph::debt_graph::DebtEdge;
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One member's aggregate position within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBalanceSummary {
    pub member: Member,
    /// Amount this member owes others.
    pub total_owed: Decimal,
    /// Amount others owe this member.
    pub total_owing: Decimal,
    /// Positive = others owe this member, negative = this member owes others.
    pub net_balance: Decimal,
}

impl MemberBalanceSummary {
    /// A member with no edges at all.
    pub fn zero(member: Member) -> Self {
        Self {
            member,
            total_owed: Decimal::ZERO,
            total_owing: Decimal::ZERO,
            net_balance: Decimal::ZERO,
        }
    }
}

/// User-facing balances of a whole group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBalanceSummary {
    pub group_id: GroupId,
    /// Netted transfers that would zero every member's position.
    pub transfers: Vec<DebtEdge>,
    /// Roster order first, then any member seen only in transfers.
    pub members: Vec<MemberBalanceSummary>,
}

impl GroupBalanceSummary {
    /// Projection onto a single member.
    pub fn member(&self, id: &MemberId) -> Option<&MemberBalanceSummary> {
        self.members.iter().find(|m| &m.member.id == id)
    }

    pub fn total_owed(&self) -> Decimal {
        self.members.iter().map(|m| m.total_owed).sum()
    }

    pub fn total_owing(&self) -> Decimal {
        self.members.iter().map(|m| m.total_owing).sum()
    }

    /// Conservation: every unit of debt has a matching unit of credit.
    pub fn is_balanced(&self) -> bool {
        let net: Decimal = self.members.iter().map(|m| m.net_balance).sum();
        self.total_owed() == self.total_owing() && net.is_zero()
    }
}

impl std::fmt::Display for GroupBalanceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Balances: {} ===", self.group_id)?;
        if self.transfers.is_empty() {
            writeln!(f, "Everyone is settled up.")?;
        }
        for transfer in &self.transfers {
            writeln!(f, "  {} owes {} {}", transfer.from, transfer.to, transfer.amount)?;
        }

        writeln!(f, "\nMember Summary:")?;
        writeln!(
            f,
            "  {:<20} {:>12} {:>12} {:>12}",
            "Name", "Owes", "Is Owed", "Net"
        )?;
        for m in &self.members {
            writeln!(
                f,
                "  {:<20} {:>12} {:>12} {:>12}",
                m.member.name, m.total_owed, m.total_owing, m.net_balance
            )?;
        }
        Ok(())
    }
}

/// Turns netted transfers into per-member figures.
pub struct BalanceSummarizer;

impl BalanceSummarizer {
    /// Summarize a group's netted transfers against its roster.
    ///
    /// For each transfer `debtor → creditor`, the debtor's `total_owed` and
    /// the creditor's `total_owing` grow by the amount; `net_balance` is
    /// `total_owing - total_owed`. Roster members without transfers get a
    /// zero summary.
    pub fn summarize(
        group_id: GroupId,
        roster: &[Member],
        transfers: Vec<DebtEdge>,
    ) -> GroupBalanceSummary {
        let mut ledger = Ledger::new();
        for member in roster {
            ledger.open(&member.id);
        }
        for transfer in &transfers {
            ledger.apply_transfer(transfer);
        }

        let mut members: Vec<MemberBalanceSummary> = Vec::with_capacity(ledger.positions().len());
        let mut seen: HashSet<&MemberId> = HashSet::with_capacity(roster.len());
        for member in roster {
            if !seen.insert(&member.id) {
                continue;
            }
            members.push(Self::member_summary(member.clone(), &ledger));
        }

        // Members referenced by facts but missing from the roster.
        for id in ledger.positions().keys() {
            if seen.contains(id) {
                continue;
            }
            warn!("member {} appears in transfers but not in the roster of {}", id, group_id);
            members.push(Self::member_summary(
                Member::new(id.as_str(), id.as_str()),
                &ledger,
            ));
        }

        if !ledger.is_balanced() {
            warn!(
                "balances of {} do not conserve: owed {} vs owing {}",
                group_id,
                ledger.total_owed(),
                ledger.total_owing()
            );
        }

        GroupBalanceSummary {
            group_id,
            transfers,
            members,
        }
    }

    fn member_summary(member: Member, ledger: &Ledger) -> MemberBalanceSummary {
        let position = ledger.position(&member.id);
        MemberBalanceSummary {
            member,
            total_owed: position.total_owed,
            total_owing: position.total_owing,
            net_balance: position.net_balance(),
        }
    }
}
