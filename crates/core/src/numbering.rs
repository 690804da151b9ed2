//! Date-prefixed document numbers (`MR20250604001`, `SC20250604002`).
//!
//! The sequence restarts at 1 for every calendar day. Numbers with a sequence
//! above 999 keep all their digits (`MR202506041000`), so lexical order within
//! a day only holds up to 999 documents; use [`DocumentNumber::sequence`] for
//! ordering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Document families that draw numbers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    MaterialRequest,
    StockCount,
}

impl DocumentKind {
    pub fn code(self) -> &'static str {
        match self {
            DocumentKind::MaterialRequest => "MR",
            DocumentKind::StockCount => "SC",
        }
    }

    /// Daily prefix, e.g. `MR20250604`.
    pub fn prefix(self, day: NaiveDate) -> String {
        format!("{}{}", self.code(), day.format("%Y%m%d"))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DocumentNumber {
    kind: DocumentKind,
    day: NaiveDate,
    sequence: u32,
}

impl DocumentNumber {
    pub fn new(kind: DocumentKind, day: NaiveDate, sequence: u32) -> DomainResult<Self> {
        if sequence == 0 {
            return Err(DomainError::validation("document sequence starts at 1"));
        }
        Ok(Self {
            kind,
            day,
            sequence,
        })
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn prefix(&self) -> String {
        self.kind.prefix(self.day)
    }

    /// Parse a number of the given kind.
    pub fn parse(kind: DocumentKind, s: &str) -> DomainResult<Self> {
        let invalid = || DomainError::invalid_id(format!("malformed document number '{s}'"));

        let rest = s.strip_prefix(kind.code()).ok_or_else(invalid)?;
        if rest.len() < 8 + 3 || !rest.is_ascii() {
            return Err(invalid());
        }
        let (date, seq) = rest.split_at(8);
        let day = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid())?;
        if !seq.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let sequence = seq.parse::<u32>().map_err(|_| invalid())?;
        Self::new(kind, day, sequence)
    }

    /// Sequence suffix of `number` if it belongs to `prefix`.
    pub fn sequence_under(prefix: &str, number: &str) -> Option<u32> {
        let seq = number.strip_prefix(prefix)?;
        if seq.len() < 3 || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        seq.parse().ok()
    }
}

impl core::fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{:03}", self.prefix(), self.sequence)
    }
}
