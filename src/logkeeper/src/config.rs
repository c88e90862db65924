//! Run configuration for the log keeper.
//!
//! A [`KeeperConfig`] is built once, validated on construction and never
//! mutated while a run is in progress.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use chrono::{DateTime, Days, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ============================================================================
// Constants
// ============================================================================

/// Default archive file name, resolved next to each rotated log file.
pub const DEFAULT_ARCHIVE_NAME: &str = "old.zip";

/// File pattern used when the selection pattern names a directory.
pub const DIRECTORY_LOG_GLOB: &str = "*.log";

// ============================================================================
// Age threshold
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl AgeUnit {
    fn parse(unit: &str) -> Option<Self> {
        let unit = match unit.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => AgeUnit::Second,
            "min" | "mins" | "minute" | "minutes" => AgeUnit::Minute,
            "h" | "hr" | "hrs" | "hour" | "hours" => AgeUnit::Hour,
            "d" | "day" | "days" => AgeUnit::Day,
            "w" | "week" | "weeks" => AgeUnit::Week,
            "mo" | "month" | "months" => AgeUnit::Month,
            "y" | "year" | "years" => AgeUnit::Year,
            _ => return None,
        };
        Some(unit)
    }

    fn label(self) -> &'static str {
        match self {
            AgeUnit::Second => "second",
            AgeUnit::Minute => "minute",
            AgeUnit::Hour => "hour",
            AgeUnit::Day => "day",
            AgeUnit::Week => "week",
            AgeUnit::Month => "month",
            AgeUnit::Year => "year",
        }
    }
}

/// How old a file must be before it is rotated, e.g. `"1 month"` or
/// `"2 weeks 3 days"`.
///
/// Months and years are subtracted on the calendar, days and weeks as whole
/// calendar days, and smaller units as exact durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgeThreshold {
    parts: Vec<(u32, AgeUnit)>,
}

impl AgeThreshold {
    pub fn days(days: u32) -> Self {
        Self {
            parts: vec![(days, AgeUnit::Day)],
        }
    }

    pub fn months(months: u32) -> Self {
        Self {
            parts: vec![(months, AgeUnit::Month)],
        }
    }

    /// The cutoff instant `now - self`. Saturates at the earliest
    /// representable instant instead of overflowing.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut months: u64 = 0;
        let mut days: u64 = 0;
        let mut seconds: i64 = 0;

        for &(amount, unit) in &self.parts {
            let amount = u64::from(amount);
            match unit {
                AgeUnit::Year => months += amount * 12,
                AgeUnit::Month => months += amount,
                AgeUnit::Week => days += amount * 7,
                AgeUnit::Day => days += amount,
                AgeUnit::Hour => seconds += amount as i64 * 3600,
                AgeUnit::Minute => seconds += amount as i64 * 60,
                AgeUnit::Second => seconds += amount as i64,
            }
        }

        let cutoff = u32::try_from(months)
            .ok()
            .and_then(|m| now.checked_sub_months(Months::new(m)))
            .and_then(|t| t.checked_sub_days(Days::new(days)))
            .and_then(|t| TimeDelta::try_seconds(seconds).and_then(|d| t.checked_sub_signed(d)));

        cutoff.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl FromStr for AgeThreshold {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidAgeThreshold {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = Vec::new();
        let mut tokens = input.split_whitespace().peekable();

        while let Some(token) = tokens.next() {
            let digits_end = token
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(token.len());
            if digits_end == 0 {
                return Err(invalid("expected a number before each unit"));
            }

            let amount: u32 = token[..digits_end]
                .parse()
                .map_err(|_| invalid("amount is too large"))?;

            let unit_text = if digits_end < token.len() {
                &token[digits_end..]
            } else {
                tokens.next().ok_or_else(|| invalid("missing unit"))?
            };
            let unit = AgeUnit::parse(unit_text)
                .ok_or_else(|| invalid(&format!("unknown unit '{}'", unit_text)))?;

            parts.push((amount, unit));
        }

        if parts.is_empty() {
            return Err(invalid("threshold is empty"));
        }

        Ok(Self { parts })
    }
}

impl TryFrom<String> for AgeThreshold {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AgeThreshold> for String {
    fn from(value: AgeThreshold) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AgeThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (amount, unit)) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let plural = if *amount == 1 { "" } else { "s" };
            write!(f, "{} {}{}", amount, unit.label(), plural)?;
        }
        Ok(())
    }
}

// ============================================================================
// Archive capacity
// ============================================================================

/// Maximum number of entries kept in an archive.
///
/// Integer form: `-1` unbounded, `0` disabled, `N > 0` bounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ArchiveCapacity {
    /// Never evict.
    #[default]
    Unbounded,
    /// Never archive; eligible files are deleted.
    Disabled,
    /// Keep at most this many entries.
    Bounded(NonZeroUsize),
}

impl ArchiveCapacity {
    pub fn is_disabled(self) -> bool {
        matches!(self, ArchiveCapacity::Disabled)
    }
}

impl TryFrom<i64> for ArchiveCapacity {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(ArchiveCapacity::Unbounded),
            0 => Ok(ArchiveCapacity::Disabled),
            n if n > 0 => usize::try_from(n)
                .ok()
                .and_then(NonZeroUsize::new)
                .map(ArchiveCapacity::Bounded)
                .ok_or(ConfigError::InvalidCapacity(n)),
            n => Err(ConfigError::InvalidCapacity(n)),
        }
    }
}

impl From<ArchiveCapacity> for i64 {
    fn from(value: ArchiveCapacity) -> Self {
        match value {
            ArchiveCapacity::Unbounded => -1,
            ArchiveCapacity::Disabled => 0,
            ArchiveCapacity::Bounded(n) => i64::try_from(n.get()).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for ArchiveCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i64::from(*self))
    }
}

// ============================================================================
// Error policy
// ============================================================================

/// What a run does when an archive cannot be opened or its directory
/// cannot be prepared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveErrorPolicy {
    /// Stop the run and return the error.
    #[default]
    Abort,
    /// Log a warning, leave the log file in place and continue.
    Skip,
}

// ============================================================================
// Configuration
// ============================================================================

/// Immutable configuration of one keeping run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawKeeperConfig")]
pub struct KeeperConfig {
    selection_pattern: String,
    age_threshold: AgeThreshold,
    archive_name: String,
    max_archive_entries: ArchiveCapacity,
    on_archive_error: ArchiveErrorPolicy,
}

impl KeeperConfig {
    /// Create a configuration with the default archive name, an unbounded
    /// archive and the abort-on-error policy.
    pub fn new(
        selection_pattern: impl Into<String>,
        age_threshold: AgeThreshold,
    ) -> Result<Self, ConfigError> {
        let selection_pattern = selection_pattern.into();
        if selection_pattern.trim().is_empty() {
            return Err(ConfigError::EmptyPattern);
        }

        Ok(Self {
            selection_pattern,
            age_threshold,
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            max_archive_entries: ArchiveCapacity::Unbounded,
            on_archive_error: ArchiveErrorPolicy::Abort,
        })
    }

    /// Set the archive file name (may contain a sub-path).
    pub fn with_archive_name(mut self, archive_name: impl Into<String>) -> Result<Self, ConfigError> {
        let archive_name = archive_name.into();
        if archive_name.trim().is_empty() {
            return Err(ConfigError::EmptyArchiveName);
        }
        self.archive_name = archive_name;
        Ok(self)
    }

    pub fn with_max_archive_entries(mut self, capacity: ArchiveCapacity) -> Self {
        self.max_archive_entries = capacity;
        self
    }

    pub fn with_archive_error_policy(mut self, policy: ArchiveErrorPolicy) -> Self {
        self.on_archive_error = policy;
        self
    }

    pub fn selection_pattern(&self) -> &str {
        &self.selection_pattern
    }

    pub fn age_threshold(&self) -> &AgeThreshold {
        &self.age_threshold
    }

    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    pub fn max_archive_entries(&self) -> ArchiveCapacity {
        self.max_archive_entries
    }

    pub fn archive_error_policy(&self) -> ArchiveErrorPolicy {
        self.on_archive_error
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawKeeperConfig {
    selection_pattern: String,
    age_threshold: AgeThreshold,
    #[serde(default = "default_archive_name")]
    archive_name: String,
    #[serde(default)]
    max_archive_entries: ArchiveCapacity,
    #[serde(default)]
    on_archive_error: ArchiveErrorPolicy,
}

fn default_archive_name() -> String {
    DEFAULT_ARCHIVE_NAME.to_string()
}

impl TryFrom<RawKeeperConfig> for KeeperConfig {
    type Error = ConfigError;

    fn try_from(raw: RawKeeperConfig) -> Result<Self, Self::Error> {
        Ok(KeeperConfig::new(raw.selection_pattern, raw.age_threshold)?
            .with_archive_name(raw.archive_name)?
            .with_max_archive_entries(raw.max_archive_entries)
            .with_archive_error_policy(raw.on_archive_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_parse_age_threshold_forms() {
        assert_eq!("1 month".parse::<AgeThreshold>().unwrap(), AgeThreshold::months(1));
        assert_eq!("30d".parse::<AgeThreshold>().unwrap(), AgeThreshold::days(30));
        assert_eq!(
            "2 weeks 3 Days".parse::<AgeThreshold>().unwrap().to_string(),
            "2 weeks 3 days"
        );
        assert_eq!("1 hour".parse::<AgeThreshold>().unwrap().to_string(), "1 hour");
    }

    #[test]
    fn test_parse_age_threshold_rejects_garbage() {
        for input in ["", "   ", "month", "1", "1 fortnight", "-1 day", "1 day 2"] {
            assert!(
                input.parse::<AgeThreshold>().is_err(),
                "'{}' should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_cutoff_uses_calendar_months() {
        let now = at(2024, 3, 31, 12, 0, 0);
        assert_eq!(AgeThreshold::months(1).cutoff(now), at(2024, 2, 29, 12, 0, 0));
        assert_eq!(
            "1 year".parse::<AgeThreshold>().unwrap().cutoff(now),
            at(2023, 3, 31, 12, 0, 0)
        );
    }

    #[test]
    fn test_cutoff_combines_units() {
        let now = at(2024, 1, 10, 12, 0, 0);
        let threshold: AgeThreshold = "1 week 2 days 3 hours 30 min 15 s".parse().unwrap();
        assert_eq!(threshold.cutoff(now), at(2024, 1, 1, 8, 29, 45));
    }

    #[test]
    fn test_cutoff_saturates() {
        let now = at(2024, 1, 1, 0, 0, 0);
        let threshold: AgeThreshold = "4000000000 years".parse().unwrap();
        assert_eq!(threshold.cutoff(now), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_capacity_from_integer() {
        assert_eq!(ArchiveCapacity::try_from(-1).unwrap(), ArchiveCapacity::Unbounded);
        assert_eq!(ArchiveCapacity::try_from(0).unwrap(), ArchiveCapacity::Disabled);
        assert_eq!(
            ArchiveCapacity::try_from(10).unwrap(),
            ArchiveCapacity::Bounded(NonZeroUsize::new(10).unwrap())
        );
        assert_eq!(
            ArchiveCapacity::try_from(-2),
            Err(ConfigError::InvalidCapacity(-2))
        );
        assert_eq!(i64::from(ArchiveCapacity::Unbounded), -1);
    }

    #[test]
    fn test_config_defaults() {
        let config = KeeperConfig::new("/var/log/app/*.log", AgeThreshold::months(1)).unwrap();
        assert_eq!(config.archive_name(), DEFAULT_ARCHIVE_NAME);
        assert_eq!(config.max_archive_entries(), ArchiveCapacity::Unbounded);
        assert_eq!(config.archive_error_policy(), ArchiveErrorPolicy::Abort);
    }

    #[test]
    fn test_config_rejects_empty_values() {
        assert_eq!(
            KeeperConfig::new("  ", AgeThreshold::days(1)),
            Err(ConfigError::EmptyPattern)
        );
        let config = KeeperConfig::new("logs", AgeThreshold::days(1)).unwrap();
        assert_eq!(config.with_archive_name(""), Err(ConfigError::EmptyArchiveName));
    }

    #[test]
    fn test_config_deserializes_with_validation() {
        let config: KeeperConfig = serde_json::from_str(
            r#"{"selection_pattern":"logs","age_threshold":"1 week","max_archive_entries":10,"on_archive_error":"skip"}"#,
        )
        .unwrap();
        assert_eq!(config.age_threshold().to_string(), "1 week");
        assert_eq!(i64::from(config.max_archive_entries()), 10);
        assert_eq!(config.archive_error_policy(), ArchiveErrorPolicy::Skip);

        let invalid = serde_json::from_str::<KeeperConfig>(
            r#"{"selection_pattern":"logs","age_threshold":"1 week","max_archive_entries":-5}"#,
        );
        assert!(invalid.is_err());
    }
}
