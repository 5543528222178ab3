use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const MAX_AMOUNT: u16 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl WindowUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "m" => Some(Self::Minutes),
            "h" => Some(Self::Hours),
            "d" => Some(Self::Days),
            "w" => Some(Self::Weeks),
            "mon" => Some(Self::Months),
            "y" => Some(Self::Years),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a relative date; expected 1-999 followed by m, h, d, w, mon or y")]
pub(crate) struct InvalidWindow(String);

// Kept as typed so Plex receives it unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RelativeWindow {
    amount: u16,
    unit: WindowUnit,
    raw: String,
}

impl RelativeWindow {
    pub(crate) fn parse(raw: &str) -> Result<Self, InvalidWindow> {
        let invalid = || InvalidWindow(raw.to_string());

        let digits_end = raw
            .find(|ch: char| !ch.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (digits, suffix) = raw.split_at(digits_end);
        if digits.is_empty() || digits.len() > 3 || digits.starts_with('0') {
            return Err(invalid());
        }
        let amount = digits.parse::<u16>().map_err(|_| invalid())?;
        if amount > MAX_AMOUNT {
            return Err(invalid());
        }
        let unit = WindowUnit::from_suffix(suffix).ok_or_else(invalid)?;

        Ok(Self {
            amount,
            unit,
            raw: raw.to_string(),
        })
    }

    pub(crate) fn amount(&self) -> u16 {
        self.amount
    }

    pub(crate) fn unit(&self) -> WindowUnit {
        self.unit
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.raw
    }

    pub(crate) fn plex_filter_value(&self) -> String {
        format!("-{}", self.raw)
    }
}

impl FromStr for RelativeWindow {
    type Err = InvalidWindow;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl fmt::Display for RelativeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
