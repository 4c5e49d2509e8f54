//! Amount type
//!
//! Domain primitive for signed ledger amounts. Positive values are income,
//! negative values are expenses. Zero is rejected at construction time; any
//! other value a `Decimal` can hold is kept exactly as entered.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Decimal places used for every displayed money value
pub const DISPLAY_SCALE: u32 = 2;

/// Amount represents a validated, signed monetary value.
///
/// # Invariants
/// - Value is never zero
/// - Value is normalized (no trailing fractional zeros)
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use zenith_ledger::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(-1200, 0)).unwrap();
/// assert!(amount.is_expense());
/// assert_eq!(amount.to_string(), "-1200");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must not be zero")]
    Zero,

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

/// Whether an amount adds to or subtracts from the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// `AmountError::Zero` if value == 0
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_zero() {
            return Err(AmountError::Zero);
        }
        Ok(Self(value.normalize()))
    }

    /// Create an Amount from an integer (no decimal places).
    pub fn from_integer(value: i64) -> Result<Self, AmountError> {
        Self::new(Decimal::from(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_income(&self) -> bool {
        self.0.is_sign_positive()
    }

    pub fn is_expense(&self) -> bool {
        self.0.is_sign_negative()
    }

    pub fn kind(&self) -> TransactionKind {
        if self.is_income() {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::ParseError("empty input".to_string()));
        }
        let decimal = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|e| AmountError::ParseError(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

// Persisted snapshots hold amounts as JSON numbers carrying every digit of
// the decimal (serde_json `arbitrary_precision`), never rounded through f64.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let number = serde_json::Number::from_str(&self.0.to_string())
            .map_err(<S::Error as serde::ser::Error>::custom)?;
        number.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-zero number")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Amount::from_integer(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Amount::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        if !v.is_finite() {
            return Err(E::custom("amount must be finite"));
        }
        // f64 Display yields the shortest round-trip digits, never an exponent
        Amount::from_str(&v.to_string()).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }

    // serde_json hands exact-precision numbers over as a single-entry map
    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Amount, A::Error> {
        let number = serde_json::Number::deserialize(de::value::MapAccessDeserializer::new(map))?;
        Amount::from_str(&number.to_string()).map_err(de::Error::custom)
    }
}

/// Round a money value for display (two places, midpoint away from zero).
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(DISPLAY_SCALE);
    rounded
}

/// Format a money value as `<symbol><value>` with two decimals, e.g. `₹-12.50`.
pub fn format_money(symbol: &str, value: Decimal) -> String {
    format!("{}{}", symbol, round_money(value))
}

/// Format an amount with an explicit sign before the symbol, e.g. `-₹12.50`.
pub fn format_signed_money(symbol: &str, amount: &Amount) -> String {
    let sign = if amount.is_expense() { '-' } else { '+' };
    format!("{}{}", sign, format_money(symbol, amount.value().abs()))
}
