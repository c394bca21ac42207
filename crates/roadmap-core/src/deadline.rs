//! Target move date and countdown

use crate::error::{TrackerError, TrackerResult};
use chrono::{DateTime, NaiveDate, Utc};
use roadmap_store::{load_json, store_json, LocalCache, DEADLINE_KEY};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// How close the deadline is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// 30 days or fewer left
    Critical,
    /// 90 days or fewer left
    Warning,
    /// More than 90 days left
    Safe,
}

impl Urgency {
    /// Classify a countdown
    #[must_use]
    pub fn from_days_left(days: i64) -> Self {
        if days <= 30 {
            Self::Critical
        } else if days <= 90 {
            Self::Warning
        } else {
            Self::Safe
        }
    }

    /// Lowercase label
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Safe => "safe",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target date of the move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deadline(NaiveDate);

impl Deadline {
    /// Deadline on `date`
    #[inline]
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse a `YYYY-MM-DD` date
    ///
    /// # Errors
    /// Returns [`TrackerError::InvalidDate`] for anything else.
    pub fn parse(input: &str) -> TrackerResult<Self> {
        NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|e| TrackerError::InvalidDate {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }

    /// Target date
    #[inline]
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Whole days from `now` to the start of the target date, rounded up
    ///
    /// Zero or negative once the date has been reached.
    #[must_use]
    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        let target = self.0.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        let seconds = (target - now).num_seconds();
        seconds.div_euclid(SECONDS_PER_DAY) + i64::from(seconds.rem_euclid(SECONDS_PER_DAY) != 0)
    }

    /// Urgency of the countdown at `now`
    #[must_use]
    pub fn urgency(&self, now: DateTime<Utc>) -> Urgency {
        Urgency::from_days_left(self.days_left(now))
    }

    /// Target date reached
    #[must_use]
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.days_left(now) <= 0
    }

    /// Stored deadline, if one was set
    ///
    /// # Errors
    /// Fails when the cache can't be read or holds something else.
    pub async fn load(cache: &dyn LocalCache) -> TrackerResult<Option<Self>> {
        Ok(load_json(cache, DEADLINE_KEY).await?)
    }

    /// Persist as the current deadline
    ///
    /// # Errors
    /// Fails when the cache can't be written.
    pub async fn save(&self, cache: &dyn LocalCache) -> TrackerResult<()> {
        store_json(cache, DEADLINE_KEY, self).await?;
        tracing::info!(date = %self.0, "deadline set");
        Ok(())
    }

    /// Forget the stored deadline
    ///
    /// # Errors
    /// Fails when the cache can't be written.
    pub async fn clear(cache: &dyn LocalCache) -> TrackerResult<()> {
        cache.remove(DEADLINE_KEY).await?;
        Ok(())
    }
}

impl std::fmt::Display for Deadline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use roadmap_store::MemoryCache;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn partial_days_round_up() {
        let deadline = Deadline::parse("2026-03-01").unwrap();
        assert_eq!(deadline.days_left(at(2026, 2, 28, 0)), 1);
        assert_eq!(deadline.days_left(at(2026, 2, 27, 12)), 2);
        assert_eq!(deadline.days_left(at(2026, 3, 1, 0)), 0);
        assert_eq!(deadline.days_left(at(2026, 3, 2, 12)), -1);
        assert!(deadline.is_past(at(2026, 3, 1, 6)));
    }

    #[test]
    fn urgency_thresholds() {
        assert_eq!(Urgency::from_days_left(-5), Urgency::Critical);
        assert_eq!(Urgency::from_days_left(30), Urgency::Critical);
        assert_eq!(Urgency::from_days_left(31), Urgency::Warning);
        assert_eq!(Urgency::from_days_left(90), Urgency::Warning);
        assert_eq!(Urgency::from_days_left(91), Urgency::Safe);
    }

    #[test]
    fn rejects_other_formats() {
        assert!(matches!(
            Deadline::parse("01/03/2026"),
            Err(TrackerError::InvalidDate { .. })
        ));
    }

    #[tokio::test]
    async fn persists_in_cache() {
        let cache = MemoryCache::new();
        assert_eq!(Deadline::load(&cache).await.unwrap(), None);

        let deadline = Deadline::parse("2027-01-15").unwrap();
        deadline.save(&cache).await.unwrap();
        assert_eq!(
            cache.get(DEADLINE_KEY).await.unwrap().as_deref(),
            Some("\"2027-01-15\"")
        );
        assert_eq!(Deadline::load(&cache).await.unwrap(), Some(deadline));

        Deadline::clear(&cache).await.unwrap();
        assert_eq!(Deadline::load(&cache).await.unwrap(), None);
    }
}
