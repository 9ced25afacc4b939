use crate::core::error::ValidationError;
use crate::core::member::{GroupId, MemberId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An out-of-band payment from one member to another.
///
/// Settlements are append-only facts. Recording one does not check that the
/// implied debt exists: a settlement may be recorded in advance, or exceed
/// what is owed, in which case the excess shows up as reverse debt after
/// netting.
///
/// # Examples
///
/// ```
/// use expense_ledger::core::settlement::Settlement;
/// use expense_ledger::core::member::{GroupId, MemberId};
/// use rust_decimal_macros::dec;
///
/// let s = Settlement::new(
///     GroupId::new("trip"),
///     MemberId::new("bob"),
///     MemberId::new("alice"),
///     dec!(20),
/// ).unwrap();
/// assert_eq!(s.amount(), dec!(20));
///
/// assert!(Settlement::new(
///     GroupId::new("trip"),
///     MemberId::new("bob"),
///     MemberId::new("bob"),
///     dec!(20),
/// ).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    id: Uuid,
    group_id: GroupId,
    from: MemberId,
    to: MemberId,
    amount: Decimal,
    created_at: DateTime<Utc>,
}

impl Settlement {
    /// Create a settlement stamped with the current time.
    pub fn new(
        group_id: GroupId,
        from: MemberId,
        to: MemberId,
        amount: Decimal,
    ) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), group_id, from, to, amount, Utc::now())
    }

    /// Create a settlement with a specific ID and timestamp (loading stored facts, tests).
    pub fn with_id(
        id: Uuid,
        group_id: GroupId,
        from: MemberId,
        to: MemberId,
        amount: Decimal,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::AmountMustBePositive(amount));
        }
        if from == to {
            return Err(ValidationError::SelfSettlement(from));
        }
        Ok(Self {
            id,
            group_id,
            from,
            to,
            amount,
            created_at,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    pub fn from(&self) -> &MemberId {
        &self.from
    }

    pub fn to(&self) -> &MemberId {
        &self.to
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settle(from: &str, to: &str, amount: Decimal) -> Result<Settlement, ValidationError> {
        Settlement::new(
            GroupId::new("g"),
            MemberId::new(from),
            MemberId::new(to),
            amount,
        )
    }

    #[test]
    fn test_settlement_creation() {
        let s = settle("a", "b", dec!(12.50)).unwrap();
        assert_eq!(s.from().as_str(), "a");
        assert_eq!(s.to().as_str(), "b");
        assert_eq!(s.amount(), dec!(12.50));
    }

    #[test]
    fn test_settlement_rejects_zero_and_negative() {
        assert_eq!(
            settle("a", "b", Decimal::ZERO).unwrap_err(),
            ValidationError::AmountMustBePositive(Decimal::ZERO)
        );
        assert!(settle("a", "b", dec!(-5)).is_err());
    }

    #[test]
    fn test_settlement_rejects_self() {
        assert_eq!(
            settle("a", "a", dec!(5)).unwrap_err(),
            ValidationError::SelfSettlement(MemberId::new("a"))
        );
    }
}
