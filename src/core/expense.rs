use crate::core::config::LedgerConfig;
use crate::core::error::{InvalidSplit, ValidationError};
use crate::core::member::{GroupId, MemberId};
use crate::core::money::approx_eq;
use crate::split::calculator::compute_splits;
use crate::split::strategy::{SplitInput, SplitStrategy};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One member's portion of a single expense.
///
/// Produced by the split calculator. The payer's own share is created with
/// `settled = true`: a payer cannot owe themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseShare {
    pub expense_id: Uuid,
    pub member: MemberId,
    pub amount: Decimal,
    pub percent: Decimal,
    pub settled: bool,
}

/// A recorded group expense together with its computed shares.
///
/// `amount` is the total across all participants, the payer's own share
/// included. Expenses are immutable once their shares exist; the only
/// permitted change is flipping a share's `settled` flag.
///
/// # Examples
///
/// ```
/// use expense_ledger::core::expense::Expense;
/// use expense_ledger::core::member::{GroupId, MemberId};
/// use expense_ledger::split::strategy::SplitInput;
/// use expense_ledger::core::config::LedgerConfig;
/// use rust_decimal_macros::dec;
///
/// let input = SplitInput::equal(vec![MemberId::new("a"), MemberId::new("b")]);
/// let expense = Expense::create(
///     GroupId::new("trip"),
///     MemberId::new("a"),
///     dec!(50),
///     &input,
///     &LedgerConfig::default(),
/// ).unwrap();
///
/// assert_eq!(expense.shares().len(), 2);
/// assert_eq!(expense.share_of(&MemberId::new("b")).unwrap().amount, dec!(25));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExpenseRecord")]
pub struct Expense {
    id: Uuid,
    group_id: GroupId,
    paid_by: MemberId,
    amount: Decimal,
    split_strategy: SplitStrategy,
    shares: Vec<ExpenseShare>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    created_at: DateTime<Utc>,
}

impl Expense {
    /// Create a new expense, computing its shares from `input`.
    pub fn create(
        group_id: GroupId,
        paid_by: MemberId,
        amount: Decimal,
        input: &SplitInput,
        config: &LedgerConfig,
    ) -> Result<Self, ValidationError> {
        let id = Uuid::new_v4();
        let shares = compute_splits(id, amount, &paid_by, input, config)?;
        Self::assemble(
            id,
            group_id,
            paid_by,
            amount,
            input.strategy(),
            shares,
            config.tolerance,
        )
    }

    /// Assemble an expense from already computed shares, e.g. as loaded from
    /// the external fact store.
    ///
    /// The shares must sum to `amount` within the default tolerance.
    pub fn from_parts(
        id: Uuid,
        group_id: GroupId,
        paid_by: MemberId,
        amount: Decimal,
        split_strategy: SplitStrategy,
        shares: Vec<ExpenseShare>,
    ) -> Result<Self, ValidationError> {
        let tolerance = LedgerConfig::default().tolerance;
        Self::assemble(id, group_id, paid_by, amount, split_strategy, shares, tolerance)
    }

    fn assemble(
        id: Uuid,
        group_id: GroupId,
        paid_by: MemberId,
        amount: Decimal,
        split_strategy: SplitStrategy,
        shares: Vec<ExpenseShare>,
        tolerance: Decimal,
    ) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::AmountMustBePositive(amount));
        }
        if shares.is_empty() {
            return Err(ValidationError::EmptyParticipantSet);
        }
        let total: Decimal = shares.iter().map(|s| s.amount).sum();
        if !approx_eq(total, amount, tolerance) {
            return Err(InvalidSplit::AmountMismatch {
                expected: amount,
                actual: total,
            }
            .into());
        }
        Ok(Self {
            id,
            group_id,
            paid_by,
            amount,
            split_strategy,
            shares,
            description: String::new(),
            category: String::new(),
            created_at: Utc::now(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    pub fn paid_by(&self) -> &MemberId {
        &self.paid_by
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn split_strategy(&self) -> SplitStrategy {
        self.split_strategy
    }

    pub fn shares(&self) -> &[ExpenseShare] {
        &self.shares
    }

    pub fn share_of(&self, member: &MemberId) -> Option<&ExpenseShare> {
        self.shares.iter().find(|s| &s.member == member)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Members whose shares still count as debt to the payer.
    pub fn debtors(&self) -> impl Iterator<Item = &ExpenseShare> {
        self.shares
            .iter()
            .filter(move |s| s.member != self.paid_by && !s.settled)
    }

    /// Mark one member's share as settled. Returns `false` if the member has
    /// no share in this expense.
    pub fn mark_settled(&mut self, member: &MemberId) -> bool {
        match self.shares.iter_mut().find(|s| &s.member == member) {
            Some(share) => {
                share.settled = true;
                true
            }
            None => false,
        }
    }

    /// Sum of all share amounts.
    pub fn shares_total(&self) -> Decimal {
        self.shares.iter().map(|s| s.amount).sum()
    }
}

/// Wire form of [`Expense`]; deserialized expenses go through the same
/// checks as [`Expense::from_parts`].
#[derive(Deserialize)]
struct ExpenseRecord {
    id: Uuid,
    group_id: GroupId,
    paid_by: MemberId,
    amount: Decimal,
    split_strategy: SplitStrategy,
    shares: Vec<ExpenseShare>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = ValidationError;

    fn try_from(record: ExpenseRecord) -> Result<Self, Self::Error> {
        Ok(Expense::from_parts(
            record.id,
            record.group_id,
            record.paid_by,
            record.amount,
            record.split_strategy,
            record.shares,
        )?
        .with_description(record.description)
        .with_category(record.category)
        .with_created_at(record.created_at))
    }
}

/// A collection of expenses belonging to one group snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseSet {
    expenses: Vec<Expense>,
}

impl ExpenseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, expense: Expense) {
        self.expenses.push(expense);
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Total of all expense amounts.
    pub fn gross_total(&self) -> Decimal {
        self.expenses.iter().map(|e| e.amount()).sum()
    }

    /// All unique members referenced as payer or participant.
    pub fn members(&self) -> Vec<MemberId> {
        let mut members: Vec<MemberId> = self
            .expenses
            .iter()
            .flat_map(|e| {
                std::iter::once(e.paid_by().clone())
                    .chain(e.shares().iter().map(|s| s.member.clone()))
            })
            .collect();
        members.sort();
        members.dedup();
        members
    }
}

impl FromIterator<Expense> for ExpenseSet {
    fn from_iter<T: IntoIterator<Item = Expense>>(iter: T) -> Self {
        Self {
            expenses: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ExpenseSet {
    type Item = Expense;
    type IntoIter = std::vec::IntoIter<Expense>;

    fn into_iter(self) -> Self::IntoIter {
        self.expenses.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn share(expense_id: Uuid, member: &str, amount: Decimal, settled: bool) -> ExpenseShare {
        ExpenseShare {
            expense_id,
            member: MemberId::new(member),
            amount,
            percent: Decimal::ZERO,
            settled,
        }
    }

    fn sample_expense() -> Expense {
        let id = Uuid::new_v4();
        Expense::from_parts(
            id,
            GroupId::new("trip"),
            MemberId::new("a"),
            dec!(90),
            SplitStrategy::Equal,
            vec![
                share(id, "a", dec!(30), true),
                share(id, "b", dec!(30), false),
                share(id, "c", dec!(30), false),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_expense_accessors() {
        let e = sample_expense()
            .with_description("dinner")
            .with_category("Food & Dining");
        assert_eq!(e.paid_by().as_str(), "a");
        assert_eq!(e.amount(), dec!(90));
        assert_eq!(e.shares_total(), dec!(90));
        assert_eq!(e.description(), "dinner");
        assert_eq!(e.category(), "Food & Dining");
    }

    #[test]
    fn test_debtors_skip_payer_and_settled() {
        let mut e = sample_expense();
        let debtors: Vec<_> = e.debtors().map(|s| s.member.as_str().to_string()).collect();
        assert_eq!(debtors, vec!["b", "c"]);

        assert!(e.mark_settled(&MemberId::new("b")));
        let debtors: Vec<_> = e.debtors().map(|s| s.member.as_str().to_string()).collect();
        assert_eq!(debtors, vec!["c"]);

        assert!(!e.mark_settled(&MemberId::new("zed")));
    }

    #[test]
    fn test_from_parts_rejects_non_positive() {
        let err = Expense::from_parts(
            Uuid::new_v4(),
            GroupId::new("trip"),
            MemberId::new("a"),
            Decimal::ZERO,
            SplitStrategy::Equal,
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::AmountMustBePositive(Decimal::ZERO));
    }

    #[test]
    fn test_from_parts_rejects_shares_not_covering_amount() {
        let id = Uuid::new_v4();
        let err = Expense::from_parts(
            id,
            GroupId::new("trip"),
            MemberId::new("a"),
            dec!(100),
            SplitStrategy::Custom,
            vec![share(id, "a", dec!(40), true), share(id, "b", dec!(50), false)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidSplit(InvalidSplit::AmountMismatch {
                expected: dec!(100),
                actual: dec!(90),
            })
        );
    }

    #[test]
    fn test_deserialize_validates_expense() {
        let expense = sample_expense().with_description("dinner");
        let json = serde_json::to_string(&expense).unwrap();
        let restored: Expense = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, expense);

        let mut value = serde_json::to_value(&expense).unwrap();
        value["amount"] = serde_json::json!("-90");
        assert!(serde_json::from_value::<Expense>(value).is_err());

        let mut value = serde_json::to_value(&expense).unwrap();
        value["amount"] = serde_json::json!("120");
        let err = serde_json::from_value::<Expense>(value).unwrap_err();
        assert!(err.to_string().contains("custom amounts must sum to total"));
    }

    #[test]
    fn test_expense_set_members() {
        let set: ExpenseSet = vec![sample_expense(), sample_expense()].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.gross_total(), dec!(180));
        assert_eq!(set.members().len(), 3);
    }
}
