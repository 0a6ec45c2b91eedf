//! Block timestamps.
//!
//! Block time is supplied by consensus with microsecond resolution and is
//! the only notion of time the economics code ever sees.

use serde::{Deserialize, Serialize};
use std::fmt;

const MICROS_PER_SECOND: u64 = 1_000_000;

/// Consensus-supplied block timestamp in microseconds since genesis epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockTime(pub u64);

impl BlockTime {
    /// Sentinel used before the first block has been seen.
    pub const GENESIS: BlockTime = BlockTime(0);

    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(MICROS_PER_SECOND))
    }

    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Whole seconds elapsed since `earlier`, discarding the sub-second
    /// remainder. `None` unless `self` is strictly after `earlier`.
    pub fn whole_seconds_since(&self, earlier: BlockTime) -> Option<u64> {
        if self.0 <= earlier.0 {
            return None;
        }
        Some((self.0 - earlier.0) / MICROS_PER_SECOND)
    }

    pub fn saturating_add_micros(&self, micros: u64) -> Self {
        Self(self.0.saturating_add(micros))
    }
}

impl fmt::Display for BlockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}s",
            self.0 / MICROS_PER_SECOND,
            self.0 % MICROS_PER_SECOND
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_discards_sub_second_remainder() {
        let prev = BlockTime::from_micros(1_000_000);
        assert_eq!(BlockTime::from_micros(3_999_999).whole_seconds_since(prev), Some(2));
        assert_eq!(BlockTime::from_micros(1_500_000).whole_seconds_since(prev), Some(0));
    }

    #[test]
    fn elapsed_requires_strict_advance() {
        let prev = BlockTime::from_secs(10);
        assert_eq!(BlockTime::from_secs(10).whole_seconds_since(prev), None);
        assert_eq!(BlockTime::from_secs(9).whole_seconds_since(prev), None);
    }

    #[test]
    fn display_shows_micros() {
        assert_eq!(BlockTime::from_micros(5_000_042).to_string(), "5.000042s");
    }
}
