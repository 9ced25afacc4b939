use crate::core::member::{GroupId, MemberId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Why a Custom or Percent split was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSplit {
    #[error("custom amounts must sum to total: expected {expected}, got {actual}")]
    AmountMismatch { expected: Decimal, actual: Decimal },
    #[error("percentages must add up to 100, got {actual}")]
    PercentMismatch { actual: Decimal },
    #[error("split value for {member} must not be negative, got {value}")]
    NegativeValue { member: MemberId, value: Decimal },
    #[error("no split value supplied for {0}")]
    MissingValue(MemberId),
}

/// Caller input that cannot be turned into ledger facts.
///
/// Always returned synchronously; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("amount must be positive, got {0}")]
    AmountMustBePositive(Decimal),
    #[error("at least one participant is required")]
    EmptyParticipantSet,
    #[error("{0} appears more than once in the split")]
    DuplicateParticipant(MemberId),
    #[error("invalid split: {0}")]
    InvalidSplit(#[from] InvalidSplit),
    #[error("unknown split strategy \"{0}\"")]
    UnknownStrategy(String),
    #[error("{0} cannot settle with themselves")]
    SelfSettlement(MemberId),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failures reported by the external fact collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("group \"{0}\" not found")]
    GroupNotFound(GroupId),
    #[error("member \"{0}\" not found")]
    MemberNotFound(MemberId),
    #[error("{0} not found")]
    NotFound(String),
    #[error("fact store unavailable: {0}")]
    Unavailable(String),
}

/// Umbrella error for operations that touch both validation and the fact feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl From<InvalidSplit> for LedgerError {
    fn from(err: InvalidSplit) -> Self {
        LedgerError::Validation(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_split_message() {
        let err = ValidationError::from(InvalidSplit::AmountMismatch {
            expected: dec!(100),
            actual: dec!(90),
        });
        assert_eq!(
            err.to_string(),
            "invalid split: custom amounts must sum to total: expected 100, got 90"
        );
    }

    #[test]
    fn test_ledger_error_is_transparent() {
        let err = LedgerError::from(FeedError::GroupNotFound(GroupId::new("trip")));
        assert_eq!(err.to_string(), "group \"trip\" not found");
    }
}
