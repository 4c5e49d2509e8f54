//! Transaction entity
//!
//! The single entity of the ledger: a described, signed amount identified by
//! the millisecond it was created.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::amount::{Amount, TransactionKind};

/// Transaction identifier: creation time as milliseconds since the Unix epoch.
///
/// Ordering ids orders transactions by creation time, which is the display
/// order (newest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(i64);

impl TransactionId {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Creation time encoded in the id, if it is a valid timestamp.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Hands out strictly increasing, timestamp-derived ids.
///
/// Two ids requested within the same millisecond differ by one, so ids stay
/// unique while still encoding (to the millisecond) when they were created.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after the largest id already in use.
    pub fn seeded<I>(existing: I) -> Self
    where
        I: IntoIterator<Item = TransactionId>,
    {
        let last = existing
            .into_iter()
            .map(|id| id.as_millis())
            .max()
            .unwrap_or(0);
        Self { last }
    }

    pub fn next_id(&mut self) -> TransactionId {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&mut self, now_millis: i64) -> TransactionId {
        let id = now_millis.max(self.last.saturating_add(1));
        self.last = id;
        TransactionId(id)
    }
}

/// Errors that can occur when creating a Description
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptionError {
    #[error("Description must not be empty")]
    Empty,
}

/// Trimmed, non-empty transaction description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    pub fn new(text: &str) -> Result<Self, DescriptionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DescriptionError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Description {
    type Error = DescriptionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Description::new(&value)
    }
}

impl From<Description> for String {
    fn from(description: Description) -> Self {
        description.0
    }
}

/// A single income or expense entry.
///
/// Persisted as `{"id": <millis>, "text": "...", "amount": <number>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    text: Description,
    amount: Amount,
}

impl Transaction {
    pub fn new(id: TransactionId, text: Description, amount: Amount) -> Self {
        Self { id, text, amount }
    }

    /// Same transaction (same id) with new details
    pub fn with_details(&self, text: Description, amount: Amount) -> Self {
        Self {
            id: self.id,
            text,
            amount,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn description(&self) -> &Description {
        &self.text
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.amount.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(id: i64, text: &str, amount: rust_decimal::Decimal) -> Transaction {
        Transaction::new(
            TransactionId::from_millis(id),
            Description::new(text).unwrap(),
            Amount::new(amount).unwrap(),
        )
    }

    #[test]
    fn test_description_is_trimmed() {
        let description = Description::new("  Rent  ").unwrap();
        assert_eq!(description.as_str(), "Rent");
    }

    #[test]
    fn test_description_rejects_blank() {
        assert_eq!(Description::new(""), Err(DescriptionError::Empty));
        assert_eq!(Description::new(" \t\n "), Err(DescriptionError::Empty));
    }

    #[test]
    fn test_id_generator_is_strictly_increasing_within_a_millisecond() {
        let mut ids = IdGenerator::new();
        let a = ids.next_at(1_700_000_000_000);
        let b = ids.next_at(1_700_000_000_000);
        let c = ids.next_at(1_699_999_999_999);

        assert_eq!(a.as_millis(), 1_700_000_000_000);
        assert_eq!(b.as_millis(), 1_700_000_000_001);
        assert_eq!(c.as_millis(), 1_700_000_000_002);
    }

    #[test]
    fn test_id_generator_seeded_from_existing_ids() {
        let mut ids = IdGenerator::seeded(vec![
            TransactionId::from_millis(10),
            TransactionId::from_millis(4_000_000_000_000),
        ]);
        let next = ids.next_id();
        assert_eq!(next.as_millis(), 4_000_000_000_001);
    }

    #[test]
    fn test_id_encodes_creation_time() {
        let id = TransactionId::from_millis(1_700_000_000_000);
        let created = id.created_at().unwrap();
        assert_eq!(created.to_rfc3339(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn test_transaction_json_layout() {
        let transaction = sample(1_700_000_000_000, "Coffee, Bean", dec!(-150));
        let json = serde_json::to_value(&transaction).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 1_700_000_000_000i64, "text": "Coffee, Bean", "amount": -150})
        );

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, transaction);
    }

    #[test]
    fn test_transaction_rejects_invalid_persisted_fields() {
        let blank = r#"{"id": 1, "text": "   ", "amount": 10}"#;
        assert!(serde_json::from_str::<Transaction>(blank).is_err());

        let zero = r#"{"id": 1, "text": "Rent", "amount": 0}"#;
        assert!(serde_json::from_str::<Transaction>(zero).is_err());
    }

    #[test]
    fn test_with_details_keeps_id() {
        let original = sample(42, "Lunch", dec!(-12));
        let updated = original.with_details(
            Description::new("Team lunch").unwrap(),
            Amount::new(dec!(-30)).unwrap(),
        );
        assert_eq!(updated.id(), original.id());
        assert_eq!(updated.text(), "Team lunch");
        assert_eq!(updated.kind(), TransactionKind::Expense);
    }
}
