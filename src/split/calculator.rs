use crate::core::config::LedgerConfig;
use crate::core::error::{InvalidSplit, ValidationError};
use crate::core::expense::ExpenseShare;
use crate::core::member::MemberId;
use crate::core::money::{allocate, approx_eq, round_to_scale};
use crate::split::strategy::SplitInput;
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashSet;
use uuid::Uuid;

/// Decimal places kept on derived percentages.
const PERCENT_SCALE: u32 = 4;

/// Compute the per-member shares of one expense.
///
/// Every participant gets exactly one share, and the payer's share is
/// flagged settled. For Equal and Percent splits the shares are rounded to
/// the configured minor unit and sum to `amount` exactly; Custom amounts
/// are kept as supplied once their sum matches `amount` within tolerance.
///
/// # Errors
///
/// - [`ValidationError::AmountMustBePositive`] for `amount <= 0`
/// - [`ValidationError::EmptyParticipantSet`] when nobody shares the expense
/// - [`ValidationError::DuplicateParticipant`] when a member is listed twice
/// - [`ValidationError::InvalidSplit`] when custom amounts or percentages
///   do not add up
///
/// # Examples
///
/// ```
/// use expense_ledger::core::config::LedgerConfig;
/// use expense_ledger::core::member::MemberId;
/// use expense_ledger::split::calculator::compute_splits;
/// use expense_ledger::split::strategy::SplitInput;
/// use rust_decimal_macros::dec;
/// use uuid::Uuid;
///
/// let (a, b, c) = (MemberId::new("a"), MemberId::new("b"), MemberId::new("c"));
/// let input = SplitInput::equal(vec![a.clone(), b, c]);
/// let config = LedgerConfig::default();
/// let shares = compute_splits(Uuid::new_v4(), dec!(90), &a, &input, &config).unwrap();
///
/// assert!(shares.iter().all(|s| s.amount == dec!(30)));
/// assert!(shares[0].settled);
/// ```
pub fn compute_splits(
    expense_id: Uuid,
    amount: Decimal,
    paid_by: &MemberId,
    input: &SplitInput,
    config: &LedgerConfig,
) -> Result<Vec<ExpenseShare>, ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::AmountMustBePositive(amount));
    }
    if input.is_empty() {
        return Err(ValidationError::EmptyParticipantSet);
    }
    check_unique(input.participants())?;

    let portions: Vec<(MemberId, Decimal, Decimal)> = match input {
        SplitInput::Equal(members) => equal_portions(amount, members, config),
        SplitInput::Custom(entries) => custom_portions(amount, entries, config)?,
        SplitInput::Percent(entries) => percent_portions(amount, entries, config)?,
    };

    let shares: Vec<ExpenseShare> = portions
        .into_iter()
        .map(|(member, share_amount, percent)| ExpenseShare {
            expense_id,
            settled: &member == paid_by,
            member,
            amount: share_amount,
            percent,
        })
        .collect();

    debug!(
        "split {} of {} over {} participants ({})",
        expense_id,
        amount,
        shares.len(),
        input.strategy()
    );
    Ok(shares)
}

fn check_unique(participants: Vec<&MemberId>) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(participants.len());
    for member in participants {
        if !seen.insert(member) {
            return Err(ValidationError::DuplicateParticipant(member.clone()));
        }
    }
    Ok(())
}

fn check_non_negative(entries: &[(MemberId, Decimal)]) -> Result<(), InvalidSplit> {
    match entries.iter().find(|(_, v)| v.is_sign_negative() && !v.is_zero()) {
        Some((member, value)) => Err(InvalidSplit::NegativeValue {
            member: member.clone(),
            value: *value,
        }),
        None => Ok(()),
    }
}

fn equal_portions(
    amount: Decimal,
    members: &[MemberId],
    config: &LedgerConfig,
) -> Vec<(MemberId, Decimal, Decimal)> {
    let n = Decimal::from(members.len());
    let raw = vec![amount / n; members.len()];
    let amounts = allocate(amount, &raw, config.scale);
    let percent = round_to_scale(Decimal::ONE_HUNDRED / n, PERCENT_SCALE);

    members
        .iter()
        .cloned()
        .zip(amounts)
        .map(|(member, share)| (member, share, percent))
        .collect()
}

fn custom_portions(
    amount: Decimal,
    entries: &[(MemberId, Decimal)],
    config: &LedgerConfig,
) -> Result<Vec<(MemberId, Decimal, Decimal)>, InvalidSplit> {
    check_non_negative(entries)?;
    let total: Decimal = entries.iter().map(|(_, v)| *v).sum();
    if !approx_eq(total, amount, config.tolerance) {
        return Err(InvalidSplit::AmountMismatch {
            expected: amount,
            actual: total,
        });
    }

    Ok(entries
        .iter()
        .map(|(member, share)| {
            let percent = round_to_scale(*share / amount * Decimal::ONE_HUNDRED, PERCENT_SCALE);
            (member.clone(), *share, percent)
        })
        .collect())
}

fn percent_portions(
    amount: Decimal,
    entries: &[(MemberId, Decimal)],
    config: &LedgerConfig,
) -> Result<Vec<(MemberId, Decimal, Decimal)>, InvalidSplit> {
    check_non_negative(entries)?;
    let total: Decimal = entries.iter().map(|(_, p)| *p).sum();
    if !approx_eq(total, Decimal::ONE_HUNDRED, config.tolerance) {
        return Err(InvalidSplit::PercentMismatch { actual: total });
    }

    let raw: Vec<Decimal> = entries
        .iter()
        .map(|(_, p)| *p / Decimal::ONE_HUNDRED * amount)
        .collect();
    let amounts = allocate(amount, &raw, config.scale);

    Ok(entries
        .iter()
        .zip(amounts)
        .map(|((member, percent), share)| (member.clone(), share, *percent))
        .collect())
}
