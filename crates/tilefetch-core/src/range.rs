//! Index window selecting the part of the catalog processed by one run.
//!
//! Both bounds are inclusive. `end = None` runs to the end of the catalog.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunRange {
    pub start: usize,
    pub end: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("start index must be >= 0 (got {0})")]
    NegativeStart(i64),
    #[error("end index must be >= 0 or -1 for all (got {0})")]
    InvalidEnd(i64),
    #[error("end index {end} is before start index {start}")]
    EndBeforeStart { start: usize, end: usize },
}

impl RunRange {
    /// Every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build from the signed CLI values, where `end == -1` means "all".
    pub fn from_flags(start: i64, end: i64) -> Result<Self, RangeError> {
        if start < 0 {
            return Err(RangeError::NegativeStart(start));
        }
        let start = start as usize;
        let end = match end {
            -1 => None,
            e if e < 0 => return Err(RangeError::InvalidEnd(e)),
            e => {
                let e = e as usize;
                if e < start {
                    return Err(RangeError::EndBeforeStart { start, end: e });
                }
                Some(e)
            }
        };
        Ok(Self { start, end })
    }

    /// Positions selected in a catalog of `len` records, clamped to the catalog.
    pub fn bounds(&self, len: usize) -> Range<usize> {
        let start = self.start.min(len);
        let end = match self.end {
            Some(e) => e.saturating_add(1).min(len),
            None => len,
        };
        start..end.max(start)
    }

    /// Sub-slice of `items` selected by this range.
    pub fn select<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.bounds(items.len())]
    }
}
