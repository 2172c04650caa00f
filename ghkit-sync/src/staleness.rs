//! Staleness check over `cache.last_synced_at`.
//!
//! Advisory only: nothing refuses to run because a snapshot is stale.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use ghkit_core::Snapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    Fresh { age: Duration },
    Stale { reason: StaleReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    NoSnapshot,
    NeverSynced,
    Expired { age: Duration },
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Staleness::Stale { .. })
    }

    /// Time since the last sync, when one is recorded.
    pub fn age(&self) -> Option<Duration> {
        match self {
            Staleness::Fresh { age }
            | Staleness::Stale {
                reason: StaleReason::Expired { age },
            } => Some(*age),
            Staleness::Stale { .. } => None,
        }
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staleness::Fresh { age } => write!(f, "fresh (synced {} ago)", format_age(*age)),
            Staleness::Stale { reason } => write!(f, "stale: {reason}"),
        }
    }
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::NoSnapshot => f.write_str("no snapshot"),
            StaleReason::NeverSynced => f.write_str("never synced"),
            StaleReason::Expired { age } => write!(f, "last synced {} ago", format_age(*age)),
        }
    }
}

/// Classify `snapshot` at `now`. A snapshot exactly `max_age_days` old is stale.
pub fn check_staleness_at(
    snapshot: Option<&Snapshot>,
    max_age_days: u32,
    now: DateTime<Utc>,
) -> Staleness {
    let Some(snapshot) = snapshot else {
        return Staleness::Stale {
            reason: StaleReason::NoSnapshot,
        };
    };
    let Some(last_synced_at) = snapshot.cache.last_synced_at else {
        return Staleness::Stale {
            reason: StaleReason::NeverSynced,
        };
    };

    // A timestamp from the future counts as just synced.
    let age = (now - last_synced_at).max(Duration::zero());
    if age >= Duration::days(i64::from(max_age_days)) {
        Staleness::Stale {
            reason: StaleReason::Expired { age },
        }
    } else {
        Staleness::Fresh { age }
    }
}

pub fn check_staleness(snapshot: Option<&Snapshot>, max_age_days: u32) -> Staleness {
    check_staleness_at(snapshot, max_age_days, Utc::now())
}

/// Coarse human age: `42s`, `5m`, `3h`, `2d`.
pub fn format_age(age: Duration) -> String {
    let seconds = age.num_seconds().max(0);
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
