//! Tiered retention policy: keep-last-N plus daily/weekly/monthly downsampling.
//!
//! Classification is recomputed from each archive's own save time on every
//! sweep, so there are no persisted "this is the weekly snapshot" tags: the
//! policy is idempotent and config changes take effect on the next sweep
//! without migration.

use crate::index::Archive;
use chrono::{DateTime, Datelike, Utc};
use std::time::Duration;

/// Retention policy for the archive directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Most-recent archives that are always retained
    pub keep_last_n: usize,

    /// Age window in which one archive per calendar day is retained
    pub keep_daily_for: Duration,

    /// Age window in which one archive per ISO week is retained
    pub keep_weekly_for: Duration,

    /// Age window in which one archive per month is retained
    pub keep_monthly_for: Duration,

    /// Period of the background sweep
    pub cleanup_interval: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_last_n: 10,
            keep_daily_for: Duration::from_secs(7 * 24 * 3600),
            keep_weekly_for: Duration::from_secs(30 * 24 * 3600),
            keep_monthly_for: Duration::from_secs(365 * 24 * 3600),
            cleanup_interval: Duration::from_secs(3600),
        }
    }
}

/// Computes the set of archives the policy no longer retains.
///
/// Pure: performs no IO and never deletes anything itself. The sweep in the
/// manager removes the returned files, logging (not aborting on) per-file
/// failures.
pub fn plan_cleanup(
    archives: &[Archive],
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Vec<Archive> {
    let mut ordered: Vec<&Archive> = archives.iter().collect();
    ordered.sort_by(|a, b| b.save_time.cmp(&a.save_time));

    let mut last_daily: Option<DateTime<Utc>> = None;
    let mut last_weekly: Option<DateTime<Utc>> = None;
    let mut last_monthly: Option<DateTime<Utc>> = None;

    let mut deletions = Vec::new();

    for (i, archive) in ordered.iter().enumerate() {
        let t = archive.save_time;

        // The last-N window also seeds every tier marker, so the tiers don't
        // redundantly re-keep a date the window already covers.
        if i < policy.keep_last_n {
            last_daily = Some(t);
            last_weekly = Some(t);
            last_monthly = Some(t);
            continue;
        }

        // Future save times (clock skew) count as age zero.
        let age = (now - t).to_std().unwrap_or(Duration::ZERO);

        if age < policy.keep_daily_for && !last_daily.is_some_and(|m| same_calendar_day(t, m)) {
            last_daily = Some(t);
            continue;
        }

        if age < policy.keep_weekly_for && !last_weekly.is_some_and(|m| same_iso_week(t, m)) {
            last_weekly = Some(t);
            continue;
        }

        if age < policy.keep_monthly_for && !last_monthly.is_some_and(|m| same_month(t, m)) {
            last_monthly = Some(t);
            continue;
        }

        deletions.push((*archive).clone());
    }

    deletions
}

// Year plus day-of-year, not day-of-month: the 15th of two different months
// must count as different days.
fn same_calendar_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.ordinal() == b.ordinal()
}

fn same_iso_week(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    let (aw, bw) = (a.iso_week(), b.iso_week());
    aw.year() == bw.year() && aw.week() == bw.week()
}

fn same_month(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
