use crate::core::error::{InvalidSplit, ValidationError};
use crate::core::member::MemberId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How an expense total is divided among its participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Everyone pays `amount / n`.
    #[default]
    Equal,
    /// Caller supplies an explicit amount per participant.
    Custom,
    /// Caller supplies a percentage per participant.
    Percent,
}

impl SplitStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitStrategy::Equal => "equal",
            SplitStrategy::Custom => "custom",
            SplitStrategy::Percent => "percent",
        }
    }
}

impl fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitStrategy {
    type Err = ValidationError;

    /// An empty name means `equal`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "equal" => Ok(SplitStrategy::Equal),
            "custom" => Ok(SplitStrategy::Custom),
            "percent" => Ok(SplitStrategy::Percent),
            _ => Err(ValidationError::UnknownStrategy(s.to_string())),
        }
    }
}

/// A strategy together with its per-participant data.
///
/// Participant order is preserved; it decides who absorbs rounding
/// residuals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "participants", rename_all = "lowercase")]
pub enum SplitInput {
    Equal(Vec<MemberId>),
    Custom(Vec<(MemberId, Decimal)>),
    Percent(Vec<(MemberId, Decimal)>),
}

impl SplitInput {
    pub fn equal(participants: Vec<MemberId>) -> Self {
        SplitInput::Equal(participants)
    }

    pub fn custom(amounts: Vec<(MemberId, Decimal)>) -> Self {
        SplitInput::Custom(amounts)
    }

    pub fn percent(percents: Vec<(MemberId, Decimal)>) -> Self {
        SplitInput::Percent(percents)
    }

    /// Build an input from loosely typed request parts.
    ///
    /// `values` is ignored for `equal`; for `custom` and `percent` every
    /// participant needs an entry.
    pub fn from_parts(
        strategy: &str,
        participants: &[MemberId],
        values: &HashMap<MemberId, Decimal>,
    ) -> Result<Self, ValidationError> {
        let strategy: SplitStrategy = strategy.parse()?;
        if strategy == SplitStrategy::Equal {
            return Ok(SplitInput::Equal(participants.to_vec()));
        }

        let mut entries = Vec::with_capacity(participants.len());
        for member in participants {
            let value = values
                .get(member)
                .copied()
                .ok_or_else(|| InvalidSplit::MissingValue(member.clone()))?;
            entries.push((member.clone(), value));
        }

        Ok(match strategy {
            SplitStrategy::Custom => SplitInput::Custom(entries),
            _ => SplitInput::Percent(entries),
        })
    }

    pub fn strategy(&self) -> SplitStrategy {
        match self {
            SplitInput::Equal(_) => SplitStrategy::Equal,
            SplitInput::Custom(_) => SplitStrategy::Custom,
            SplitInput::Percent(_) => SplitStrategy::Percent,
        }
    }

    /// Participants in the order they were supplied.
    pub fn participants(&self) -> Vec<&MemberId> {
        match self {
            SplitInput::Equal(members) => members.iter().collect(),
            SplitInput::Custom(entries) | SplitInput::Percent(entries) => {
                entries.iter().map(|(m, _)| m).collect()
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SplitInput::Equal(members) => members.len(),
            SplitInput::Custom(entries) | SplitInput::Percent(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
