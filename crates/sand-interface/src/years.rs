//! Model horizon
//!
//! Provides [`YearRange`], the inclusive range that defines the YEAR domain.

use crate::error::{SourceError, SourceResult};

/// Name of the time index
pub const YEAR: &str = "YEAR";

/// Inclusive range of model years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    /// Create range `start..=end`
    ///
    /// # Errors
    /// Returns `SourceError::InvalidYearRange` if `start > end`
    pub fn new(start: i32, end: i32) -> SourceResult<Self> {
        if start > end {
            return Err(SourceError::InvalidYearRange { start, end });
        }
        Ok(Self { start, end })
    }

    #[inline]
    #[must_use]
    pub fn start(&self) -> i32 {
        self.start
    }

    #[inline]
    #[must_use]
    pub fn end(&self) -> i32 {
        self.end
    }

    /// Number of years, both ends included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        let span = i64::from(self.end) - i64::from(self.start) + 1;
        usize::try_from(span).unwrap_or(usize::MAX)
    }

    /// Always false: a valid range holds at least one year
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// Iterate over every year
    pub fn iter(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    /// YEAR domain as index values
    #[must_use]
    pub fn domain(&self) -> Vec<String> {
        self.iter().map(|year| year.to_string()).collect()
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            start: 2015,
            end: 2070,
        }
    }
}
