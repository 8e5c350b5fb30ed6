// libs/appointment-cell/src/clock.rs
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use tracing::warn;

use shared_config::AppConfig;

use crate::models::Slot;

/// Wall clock of the practice. Dates and times on appointments are local to it.
#[derive(Debug, Clone, Copy)]
pub struct PracticeClock {
    offset: FixedOffset,
}

impl PracticeClock {
    pub fn new(config: &AppConfig) -> Self {
        Self::from_offset_minutes(config.practice_utc_offset_minutes)
    }

    pub fn from_offset_minutes(minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| {
            warn!("Practice UTC offset of {} minutes is out of range, using UTC", minutes);
            Utc.fix()
        });
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    pub fn local_start(&self, slot: &Slot) -> DateTime<FixedOffset> {
        // A fixed offset has no gaps or folds, so the mapping is always single.
        self.offset
            .from_local_datetime(&slot.date.and_time(slot.time))
            .single()
            .unwrap_or_else(|| self.offset.from_utc_datetime(&slot.date.and_time(slot.time)))
    }

    pub fn slot_instant(&self, slot: &Slot) -> DateTime<Utc> {
        self.local_start(slot).with_timezone(&Utc)
    }
}
