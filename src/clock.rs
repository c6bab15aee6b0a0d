//! Service day bookkeeping
//!
//! The community runs on Korean time, so "today" is the calendar date in a fixed UTC offset
//! rather than the host's local zone.  Day boundaries are only ever detected lazily, when some
//! handler or poll asks; there is no scheduled midnight job.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

pub struct DayClock {
    offset: FixedOffset,
    /// `None` until the first observation.
    current: Option<NaiveDate>,
}

impl DayClock {
    /// Offsets of a day or more are meaningless and fall back to UTC.
    pub fn new(utc_offset_hours: i32) -> Self {
        let offset = utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());

        Self {
            offset,
            current: None,
        }
    }

    pub fn service_day(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// Record the service day containing `now`.  Returns true only when a previously observed
    /// day has been left behind; the very first observation is a baseline, not a rollover.
    pub fn roll(&mut self, now: DateTime<Utc>) -> bool {
        let today = self.service_day(now);
        let rolled = matches!(self.current, Some(day) if day != today);
        self.current = Some(today);
        rolled
    }
}
