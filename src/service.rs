//! Ledger operations over an external fact store.
//!
//! Every balance query takes one consistent snapshot of the group's facts and
//! recomputes from scratch: aggregate, net, summarize. No intermediate state
//! is kept between calls.

use crate::core::config::LedgerConfig;
use crate::core::error::{LedgerError, ValidationError};
use crate::core::expense::Expense;
use crate::core::member::{GroupId, MemberId};
use crate::core::settlement::Settlement;
use crate::feed::ports::{FactFeed, FactSink, GroupSnapshot, MemberDirectory};
use crate::graph::debt_graph::LedgerAggregator;
use crate::optimization::netting::{DebtNetter, NettingResult};
use crate::optimization::summary::{BalanceSummarizer, GroupBalanceSummary, MemberBalanceSummary};
use crate::split::strategy::SplitInput;
use log::info;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Compute the balances of one group from a snapshot of its facts.
///
/// This is the whole pure pipeline; [`LedgerService`] only adds fetching.
pub fn calculate_balances(
    group_id: GroupId,
    snapshot: &GroupSnapshot,
    config: &LedgerConfig,
) -> GroupBalanceSummary {
    let netting = net_snapshot(snapshot, config);
    BalanceSummarizer::summarize(group_id, &snapshot.members, netting.into_transfers())
}

/// Aggregate and net a snapshot, keeping the netting statistics.
pub fn net_snapshot(snapshot: &GroupSnapshot, config: &LedgerConfig) -> NettingResult {
    let graph = LedgerAggregator::aggregate(
        snapshot.members.iter().map(|m| &m.id),
        &snapshot.expenses,
        &snapshot.settlements,
    );
    DebtNetter::net(&graph, config.tolerance)
}

/// Balance queries and fact recording for groups held by a store `S`.
///
/// # Examples
///
/// ```
/// use expense_ledger::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let facts = InMemoryFacts::new();
/// let trip = GroupId::new("trip");
/// facts.create_group(trip.clone()).unwrap();
/// facts.add_member(&trip, Member::new("a", "Alice")).unwrap();
/// facts.add_member(&trip, Member::new("b", "Bob")).unwrap();
///
/// let service = LedgerService::new(facts);
/// let split = SplitInput::equal(vec![MemberId::new("a"), MemberId::new("b")]);
/// service
///     .record_expense(&trip, MemberId::new("a"), dec!(60), "taxi", "Transportation", &split)
///     .unwrap();
///
/// let balances = service.calculate_group_balances(&trip).unwrap();
/// assert_eq!(balances.transfers.len(), 1);
/// assert_eq!(balances.transfers[0].amount, dec!(30));
/// ```
#[derive(Debug, Clone)]
pub struct LedgerService<S> {
    store: S,
    config: LedgerConfig,
}

impl<S> LedgerService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: LedgerConfig::default(),
        }
    }

    pub fn with_config(store: S, config: LedgerConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: FactFeed> LedgerService<S> {
    /// Who owes whom across the whole group.
    pub fn calculate_group_balances(
        &self,
        group: &GroupId,
    ) -> Result<GroupBalanceSummary, LedgerError> {
        let snapshot = self.store.snapshot(group)?;
        Ok(calculate_balances(group.clone(), &snapshot, &self.config))
    }
}

impl<S: FactFeed + MemberDirectory> LedgerService<S> {
    /// One member's figures. A member without any edges, or not on the
    /// roster at all, gets a zero summary; only a member unknown to the
    /// directory is an error.
    pub fn calculate_member_balance(
        &self,
        group: &GroupId,
        member: &MemberId,
    ) -> Result<MemberBalanceSummary, LedgerError> {
        let summary = self.calculate_group_balances(group)?;
        if let Some(found) = summary.member(member) {
            return Ok(found.clone());
        }
        let user = self.store.lookup(member)?;
        Ok(MemberBalanceSummary::zero(user))
    }
}

impl<S: FactFeed + FactSink> LedgerService<S> {
    /// Record an out-of-band payment and return the recomputed balances.
    ///
    /// Only `amount > 0` and `from != to` are checked; the payment is not
    /// matched against existing debt.
    pub fn record_settlement(
        &self,
        group: &GroupId,
        from: MemberId,
        to: MemberId,
        amount: Decimal,
    ) -> Result<GroupBalanceSummary, LedgerError> {
        let settlement = Settlement::new(group.clone(), from, to, amount)?;
        info!(
            "recording settlement {}: {} paid {} {}",
            settlement.id(),
            settlement.from(),
            settlement.to(),
            settlement.amount()
        );
        self.store.append_settlement(settlement)?;
        self.calculate_group_balances(group)
    }

    /// Validate and split a new expense, then append it.
    pub fn record_expense(
        &self,
        group: &GroupId,
        paid_by: MemberId,
        amount: Decimal,
        description: &str,
        category: &str,
        split: &SplitInput,
    ) -> Result<Expense, LedgerError> {
        let expense = Expense::create(group.clone(), paid_by, amount, split, &self.config)?
            .with_description(description)
            .with_category(category);
        info!(
            "recording expense {} of {} paid by {} ({} split, {} shares)",
            expense.id(),
            expense.amount(),
            expense.paid_by(),
            expense.split_strategy(),
            expense.shares().len()
        );
        self.store.append_expense(expense.clone())?;
        Ok(expense)
    }

    /// Mark one member's share of an expense as paid back.
    pub fn mark_share_settled(
        &self,
        group: &GroupId,
        expense_id: Uuid,
        member: &MemberId,
    ) -> Result<(), LedgerError> {
        info!("marking share of {} in expense {} settled", member, expense_id);
        Ok(self.store.mark_share_settled(group, expense_id, member)?)
    }

    pub fn remove_expense(&self, group: &GroupId, expense_id: Uuid) -> Result<(), LedgerError> {
        info!("removing expense {} from {}", expense_id, group);
        Ok(self.store.remove_expense(group, expense_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{FeedError, InvalidSplit};
    use crate::core::member::Member;
    use crate::feed::memory::InMemoryFacts;
    use rust_decimal_macros::dec;

    fn m(id: &str) -> MemberId {
        MemberId::new(id)
    }

    fn setup() -> (LedgerService<InMemoryFacts>, GroupId) {
        let facts = InMemoryFacts::new();
        let g = GroupId::new("flat");
        facts.create_group(g.clone()).unwrap();
        for (id, name) in [("a", "Alice"), ("b", "Bob"), ("c", "Carol")] {
            facts.add_member(&g, Member::new(id, name)).unwrap();
        }
        (LedgerService::new(facts), g)
    }

    #[test]
    fn test_equal_expense_balances() {
        let (service, g) = setup();
        let split = SplitInput::equal(vec![m("a"), m("b"), m("c")]);
        service
            .record_expense(&g, m("a"), dec!(90.00), "groceries", "Food & Dining", &split)
            .unwrap();

        let summary = service.calculate_group_balances(&g).unwrap();
        assert_eq!(summary.transfers.len(), 2);
        let a = summary.member(&m("a")).unwrap();
        assert_eq!(a.total_owing, dec!(60));
        assert_eq!(a.net_balance, dec!(60));
        assert!(summary.is_balanced());
    }

    #[test]
    fn test_settlement_reduces_debt() {
        let (service, g) = setup();
        let split = SplitInput::custom(vec![(m("a"), dec!(50)), (m("b"), dec!(50))]);
        service
            .record_expense(&g, m("b"), dec!(100), "", "", &split)
            .unwrap();

        let summary = service
            .record_settlement(&g, m("a"), m("b"), dec!(20.00))
            .unwrap();
        assert_eq!(summary.transfers.len(), 1);
        assert_eq!(summary.transfers[0].from, m("a"));
        assert_eq!(summary.transfers[0].to, m("b"));
        assert_eq!(summary.transfers[0].amount, dec!(30.00));
    }

    #[test]
    fn test_settlement_validation() {
        let (service, g) = setup();
        assert_eq!(
            service
                .record_settlement(&g, m("a"), m("a"), dec!(5))
                .unwrap_err(),
            LedgerError::Validation(ValidationError::SelfSettlement(m("a")))
        );
        assert!(matches!(
            service.record_settlement(&g, m("a"), m("b"), dec!(0)),
            Err(LedgerError::Validation(ValidationError::AmountMustBePositive(_)))
        ));
    }

    #[test]
    fn test_speculative_settlement_creates_reverse_debt() {
        let (service, g) = setup();
        let summary = service
            .record_settlement(&g, m("a"), m("b"), dec!(15))
            .unwrap();
        assert_eq!(summary.transfers.len(), 1);
        assert_eq!(summary.transfers[0].from, m("b"));
        assert_eq!(summary.transfers[0].to, m("a"));
        assert_eq!(summary.transfers[0].amount, dec!(15));
    }

    #[test]
    fn test_invalid_split_not_recorded() {
        let (service, g) = setup();
        let split = SplitInput::custom(vec![(m("a"), dec!(40)), (m("b"), dec!(50))]);
        let err = service
            .record_expense(&g, m("a"), dec!(100.00), "", "", &split)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::InvalidSplit(
                InvalidSplit::AmountMismatch { .. }
            ))
        ));
        assert!(service
            .store()
            .list_expenses_with_shares(&g)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_member_balance_projection() {
        let (service, g) = setup();
        let split = SplitInput::equal(vec![m("a"), m("b")]);
        service
            .record_expense(&g, m("a"), dec!(40), "", "", &split)
            .unwrap();

        let b = service.calculate_member_balance(&g, &m("b")).unwrap();
        assert_eq!(b.total_owed, dec!(20));
        assert_eq!(b.net_balance, dec!(-20));

        let c = service.calculate_member_balance(&g, &m("c")).unwrap();
        assert_eq!(c.total_owed, Decimal::ZERO);
        assert_eq!(c.total_owing, Decimal::ZERO);
        assert_eq!(c.net_balance, Decimal::ZERO);
    }

    #[test]
    fn test_member_outside_roster() {
        let (service, g) = setup();
        service
            .store()
            .register_user(Member::new("outsider", "Olga"))
            .unwrap();
        let o = service.calculate_member_balance(&g, &m("outsider")).unwrap();
        assert_eq!(o.member.name, "Olga");
        assert_eq!(o.net_balance, Decimal::ZERO);

        assert_eq!(
            service.calculate_member_balance(&g, &m("ghost")).unwrap_err(),
            LedgerError::Feed(FeedError::MemberNotFound(m("ghost")))
        );
    }

    #[test]
    fn test_mark_share_settled_clears_edge() {
        let (service, g) = setup();
        let split = SplitInput::equal(vec![m("a"), m("b")]);
        let expense = service
            .record_expense(&g, m("a"), dec!(40), "", "", &split)
            .unwrap();
        service.mark_share_settled(&g, expense.id(), &m("b")).unwrap();

        let summary = service.calculate_group_balances(&g).unwrap();
        assert!(summary.transfers.is_empty());
    }

    #[test]
    fn test_remove_expense_restores_balances() {
        let (service, g) = setup();
        let split = SplitInput::equal(vec![m("a"), m("b")]);
        let expense = service
            .record_expense(&g, m("a"), dec!(40), "", "", &split)
            .unwrap();
        service.remove_expense(&g, expense.id()).unwrap();
        assert!(service
            .calculate_group_balances(&g)
            .unwrap()
            .transfers
            .is_empty());
    }

    #[test]
    fn test_unknown_group() {
        let (service, _) = setup();
        assert_eq!(
            service
                .calculate_group_balances(&GroupId::new("nope"))
                .unwrap_err(),
            LedgerError::Feed(FeedError::GroupNotFound(GroupId::new("nope")))
        );
    }

    #[test]
    fn test_with_config_validates() {
        let config = LedgerConfig::default().with_tolerance(dec!(-1));
        assert!(LedgerService::with_config(InMemoryFacts::new(), config).is_err());
    }
}
