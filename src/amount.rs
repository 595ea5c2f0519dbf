//! Parsing and formatting for the fixed-point `Amount` message.

use std::fmt;
use std::str::FromStr;

use crate::proto::Amount;

const NANOS_PER_UNIT: i32 = 1_000_000_000;
const NANO_DIGITS: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("{0:?} is not a decimal number")]
    Malformed(String),
    #[error("{0:?} has more than nine fractional digits")]
    TooPrecise(String),
    #[error("{0:?} does not fit in an amount")]
    OutOfRange(String),
}

impl Amount {
    pub fn new(units: i64, nanos: i32) -> Self {
        Self { units, nanos }
    }

    /// The whole value in nanos; exact for any `units`/`nanos` pair.
    pub fn total_nanos(&self) -> i128 {
        i128::from(self.units) * i128::from(NANOS_PER_UNIT) + i128::from(self.nanos)
    }

    pub fn is_negative(&self) -> bool {
        self.total_nanos() < 0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        let malformed = || AmountError::Malformed(s.to_string());

        let (negative, digits) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(malformed());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if frac.len() > NANO_DIGITS {
            return Err(AmountError::TooPrecise(s.to_string()));
        }

        let units: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| AmountError::OutOfRange(s.to_string()))?
        };
        // right-pad to nine digits: "09999" -> "099990000"
        let nanos: i32 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<width$}", width = NANO_DIGITS)
                .parse()
                .map_err(|_| malformed())?
        };
        debug_assert!(nanos < NANOS_PER_UNIT);

        if negative {
            Ok(Amount::new(-units, -nanos))
        } else {
            Ok(Amount::new(units, nanos))
        }
    }
}

/// Renders `units.nanos`, trimming trailing zeros but keeping two decimals.
///
/// The value is `units + nanos / 10^9` even when the server breaks the sign
/// or range rules, so `(1, -500_000_000)` prints `0.50`.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let total = self.total_nanos().unsigned_abs();
        let per_unit = NANOS_PER_UNIT as u128;
        let mut frac = format!("{:09}", total % per_unit);
        while frac.len() > 2 && frac.ends_with('0') {
            frac.pop();
        }
        write!(f, "{sign}{}.{frac}", total / per_unit)
    }
}
