//! Simulation time and time intervals
//!
//! Simulation time is an absolute UTC instant. Intervals use ISO 8601
//! `start/stop` notation when read from scene documents.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::DocumentError;

/// An instant on the simulation clock
pub type SimTime = DateTime<Utc>;

/// Parse an RFC 3339 / ISO 8601 timestamp into simulation time
pub fn parse_time(text: &str) -> Result<SimTime, DocumentError> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DocumentError::InvalidTime(format!("{}: {}", text, e)))
}

/// Signed seconds from `earlier` to `later`
pub fn seconds_between(later: SimTime, earlier: SimTime) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(us) => us as f64 * 1e-6,
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}

/// Offset a time by fractional seconds, rounded to the microsecond
///
/// # Errors
///
/// Returns [`DocumentError::InvalidTime`] if `seconds` is not finite or the
/// result falls outside the representable range.
pub fn checked_add_seconds(time: SimTime, seconds: f64) -> Result<SimTime, DocumentError> {
    let out_of_range = || {
        DocumentError::InvalidTime(format!("{} offset by {}s is out of range", time, seconds))
    };
    let micros = (seconds * 1e6).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return Err(out_of_range());
    }
    time.checked_add_signed(TimeDelta::microseconds(micros as i64)).ok_or_else(out_of_range)
}

/// Offset a time by fractional seconds, saturating at the ends of the clock
pub fn add_seconds(time: SimTime, seconds: f64) -> SimTime {
    checked_add_seconds(time, seconds).unwrap_or(if seconds < 0.0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// A span of simulation time with configurable endpoint inclusion
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: SimTime,
    pub stop: SimTime,
    pub is_start_included: bool,
    pub is_stop_included: bool,
}

impl TimeInterval {
    /// Closed interval `[start, stop]`
    pub fn closed(start: SimTime, stop: SimTime) -> Self {
        Self { start, stop, is_start_included: true, is_stop_included: true }
    }

    /// Half-open interval `[start, stop)`
    pub fn half_open(start: SimTime, stop: SimTime) -> Self {
        Self { start, stop, is_start_included: true, is_stop_included: false }
    }

    /// Parse `start/stop`. Both endpoints are included.
    pub fn from_iso8601(text: &str) -> Result<Self, DocumentError> {
        let (start, stop) = text
            .split_once('/')
            .ok_or_else(|| DocumentError::InvalidInterval(text.to_string()))?;
        let start = parse_time(start)?;
        let stop = parse_time(stop)?;
        if stop < start {
            return Err(DocumentError::InvalidInterval(format!("{} ends before it starts", text)));
        }
        Ok(Self::closed(start, stop))
    }

    /// True if the interval contains no instants
    pub fn is_empty(&self) -> bool {
        self.stop < self.start
            || (self.stop == self.start && !(self.is_start_included && self.is_stop_included))
    }

    pub fn contains(&self, time: SimTime) -> bool {
        if self.is_empty() {
            return false;
        }
        let after_start =
            if self.is_start_included { time >= self.start } else { time > self.start };
        let before_stop =
            if self.is_stop_included { time <= self.stop } else { time < self.stop };
        after_start && before_stop
    }
}

/// Ordered set of intervals, used for entity availability
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeIntervalCollection {
    intervals: Vec<TimeInterval>,
}

impl TimeIntervalCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_intervals(intervals: impl IntoIterator<Item = TimeInterval>) -> Self {
        let mut collection = Self::new();
        for interval in intervals {
            collection.add(interval);
        }
        collection
    }

    /// Insert keeping start order; empty intervals are ignored
    pub fn add(&mut self, interval: TimeInterval) {
        if interval.is_empty() {
            return;
        }
        let index = self.intervals.partition_point(|i| i.start <= interval.start);
        self.intervals.insert(index, interval);
    }

    pub fn contains(&self, time: SimTime) -> bool {
        self.find(time).is_some()
    }

    /// First interval containing `time`
    pub fn find(&self, time: SimTime) -> Option<&TimeInterval> {
        self.intervals.iter().find(|i| i.contains(time))
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeInterval> {
        self.intervals.iter()
    }
}
