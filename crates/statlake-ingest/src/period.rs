//! Period extraction from filenames
//!
//! Published files embed their reporting period as `<prefix>_MM_YY.<ext>`
//! (e.g. `sh_ipc_05_24.xls` is May 2024). A 2-digit year is read as 2000+YY.
//! A filename that does not follow the grammar falls back to the processing
//! date; a filename that follows it but yields an impossible month is
//! rejected rather than silently misfiled.

use crate::error::{IngestError, Result};
use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// Filename grammar: two 2-digit groups right before the extension.
const PERIOD_GRAMMAR: &str = r"_(\d{2})_(\d{2})\.[[:alnum:]]+$";

/// A year/month partition key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Fallback period for filenames without an embedded one.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The `<year>/<month:02>` destination path segment.
    pub fn partition_segment(&self) -> String {
        format!("{}/{:02}", self.year, self.month)
    }
}

/// Extract the embedded period from a filename.
///
/// Returns `Ok(None)` when the grammar does not match (the caller falls back
/// to the processing date) and `Err(InvalidPeriod)` when it matches but the
/// month is out of range.
pub fn extract(filename: &str) -> Result<Option<Period>> {
    let grammar = Regex::new(PERIOD_GRAMMAR)?;

    let Some(captures) = grammar.captures(filename) else {
        return Ok(None);
    };

    // Both groups are \d{2}, parse cannot fail.
    let month: u32 = captures[1].parse().unwrap_or(0);
    let year_suffix: i32 = captures[2].parse().unwrap_or(0);

    if !(1..=12).contains(&month) {
        return Err(IngestError::InvalidPeriod {
            filename: filename.to_string(),
            month,
        });
    }

    Ok(Some(Period {
        year: 2000 + year_suffix,
        month,
    }))
}
