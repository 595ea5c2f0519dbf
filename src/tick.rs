use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::proto::{Amount, Quote};

/// One streamed price update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub price: Amount,
    pub at: Option<DateTime<Utc>>,
}

impl From<Quote> for Tick {
    fn from(quote: Quote) -> Self {
        let at = quote.t.and_then(|t| {
            let nanos = u32::try_from(t.nanos).ok()?;
            Utc.timestamp_opt(t.seconds, nanos).single()
        });
        Self {
            price: quote.price.unwrap_or_default(),
            at,
        }
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.at {
            Some(at) => write!(
                f,
                "{}---{}",
                self.price,
                at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            ),
            None => write!(f, "{}----", self.price),
        }
    }
}
