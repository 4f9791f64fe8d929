//! Time-sampled properties
//!
//! A property resolves to a value at a given simulation time, or to nothing
//! when it is undefined there (outside its intervals or sample range).
//!
//! ## Key Components
//!
//! - [`TimeProperty`] - Sampling trait, used through [`PropertyRef`]
//! - [`ConstantProperty`] - Same value at every time
//! - [`IntervalProperty`] - Piecewise-constant value per time interval
//! - [`SampledProperty`] - Linear interpolation between time-tagged samples
//! - [`ScopedProperty`] - Restricts another property to one interval

use std::fmt;
use std::sync::Arc;

use sensorvol_math::{Quat, Vec3};

use crate::color::Color;
use crate::time::{seconds_between, SimTime, TimeInterval};

/// A value that varies over simulation time
pub trait TimeProperty<T>: Send + Sync + fmt::Debug {
    /// Value at `time`, or `None` if undefined there
    fn value(&self, time: SimTime) -> Option<T>;

    /// True if the value never changes with time
    fn is_constant(&self) -> bool {
        false
    }
}

/// Shared, immutable property handle
pub type PropertyRef<T> = Arc<dyn TimeProperty<T>>;

/// Sample an optional property, yielding `None` when absent or undefined
pub fn value_or_undefined<T>(property: Option<&PropertyRef<T>>, time: SimTime) -> Option<T> {
    property.and_then(|p| p.value(time))
}

/// Sample an optional property, falling back to `default`
pub fn value_or_default<T>(property: Option<&PropertyRef<T>>, time: SimTime, default: T) -> T {
    value_or_undefined(property, time).unwrap_or(default)
}

/// Wrap a plain value as a constant property
pub fn constant<T>(value: T) -> PropertyRef<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    Arc::new(ConstantProperty::new(value))
}

/// A property with the same value at every time
#[derive(Clone, Debug)]
pub struct ConstantProperty<T> {
    value: T,
}

impl<T> ConstantProperty<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Clone + Send + Sync + fmt::Debug> TimeProperty<T> for ConstantProperty<T> {
    fn value(&self, _time: SimTime) -> Option<T> {
        Some(self.value.clone())
    }

    fn is_constant(&self) -> bool {
        true
    }
}

/// Piecewise-constant property: one value per interval, undefined in gaps
#[derive(Clone, Debug)]
pub struct IntervalProperty<T> {
    intervals: Vec<(TimeInterval, T)>,
}

impl<T> Default for IntervalProperty<T> {
    fn default() -> Self {
        Self { intervals: Vec::new() }
    }
}

impl<T> IntervalProperty<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value for an interval. Earlier entries win where intervals overlap.
    pub fn with_interval(mut self, interval: TimeInterval, value: T) -> Self {
        self.intervals.push((interval, value));
        self
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

impl<T: Clone + Send + Sync + fmt::Debug> TimeProperty<T> for IntervalProperty<T> {
    fn value(&self, time: SimTime) -> Option<T> {
        self.intervals
            .iter()
            .find(|(interval, _)| interval.contains(time))
            .map(|(_, value)| value.clone())
    }
}

/// Values that can be linearly interpolated between samples
pub trait Interpolate: Clone {
    fn interpolate(&self, other: &Self, t: f64) -> Self;
}

impl Interpolate for f64 {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for Vec3 {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self.lerp(*other, t)
    }
}

impl Interpolate for Quat {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self.nlerp(*other, t)
    }
}

impl Interpolate for Color {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self.lerp(*other, t as f32)
    }
}

/// Time-tagged samples with linear interpolation and no extrapolation
#[derive(Clone, Debug)]
pub struct SampledProperty<T> {
    samples: Vec<(SimTime, T)>,
}

impl<T> Default for SampledProperty<T> {
    fn default() -> Self {
        Self { samples: Vec::new() }
    }
}

impl<T> SampledProperty<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sample, keeping samples sorted by time. A sample at an
    /// existing time replaces it.
    pub fn add_sample(&mut self, time: SimTime, value: T) {
        match self.samples.binary_search_by(|(t, _)| t.cmp(&time)) {
            Ok(index) => self.samples[index].1 = value,
            Err(index) => self.samples.insert(index, (time, value)),
        }
    }

    pub fn with_sample(mut self, time: SimTime, value: T) -> Self {
        self.add_sample(time, value);
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl<T: Interpolate + Send + Sync + fmt::Debug> TimeProperty<T> for SampledProperty<T> {
    fn value(&self, time: SimTime) -> Option<T> {
        let index = self.samples.partition_point(|(t, _)| *t <= time);
        if index == 0 {
            return None;
        }
        let (t0, v0) = &self.samples[index - 1];
        if *t0 == time {
            return Some(v0.clone());
        }
        let (t1, v1) = self.samples.get(index)?;
        let span = seconds_between(*t1, *t0);
        let t = seconds_between(time, *t0) / span;
        Some(v0.interpolate(v1, t))
    }
}

/// Restricts an inner property to a single interval
#[derive(Debug)]
pub struct ScopedProperty<T> {
    interval: TimeInterval,
    inner: PropertyRef<T>,
}

impl<T> ScopedProperty<T> {
    pub fn new(interval: TimeInterval, inner: PropertyRef<T>) -> Self {
        Self { interval, inner }
    }
}

impl<T: fmt::Debug + 'static> TimeProperty<T> for ScopedProperty<T> {
    fn value(&self, time: SimTime) -> Option<T> {
        if self.interval.contains(time) {
            self.inner.value(time)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{add_seconds, parse_time};

    const EPSILON: f64 = 1e-9;

    fn t0() -> SimTime {
        parse_time("2024-01-01T00:00:00Z").unwrap()
    }

    #[test]
    fn test_constant() {
        let p = constant(3.5f64);
        assert_eq!(p.value(t0()), Some(3.5));
        assert!(p.is_constant());
    }

    #[test]
    fn test_value_or_default() {
        let none: Option<&PropertyRef<bool>> = None;
        assert!(value_or_default(none, t0(), true));

        let p = constant(false);
        assert!(!value_or_default(Some(&p), t0(), true));
    }

    #[test]
    fn test_interval_property_gaps_are_undefined() {
        let start = t0();
        let stop = add_seconds(start, 10.0);
        let p = IntervalProperty::new().with_interval(TimeInterval::half_open(start, stop), true);
        assert_eq!(p.value(start), Some(true));
        assert_eq!(p.value(add_seconds(start, 9.9)), Some(true));
        assert_eq!(p.value(stop), None);
    }

    #[test]
    fn test_sampled_interpolates() {
        let p = SampledProperty::new()
            .with_sample(t0(), 0.0f64)
            .with_sample(add_seconds(t0(), 10.0), 100.0);
        let mid = p.value(add_seconds(t0(), 2.5)).unwrap();
        assert!((mid - 25.0).abs() < EPSILON);
        assert_eq!(p.value(add_seconds(t0(), 10.0)), Some(100.0));
    }

    #[test]
    fn test_sampled_does_not_extrapolate() {
        let p = SampledProperty::new()
            .with_sample(t0(), Vec3::ZERO)
            .with_sample(add_seconds(t0(), 1.0), Vec3::X);
        assert_eq!(p.value(add_seconds(t0(), -1.0)), None);
        assert_eq!(p.value(add_seconds(t0(), 2.0)), None);
    }

    #[test]
    fn test_sampled_replaces_same_time() {
        let mut p = SampledProperty::new();
        p.add_sample(t0(), 1.0f64);
        p.add_sample(t0(), 2.0);
        assert_eq!(p.len(), 1);
        assert_eq!(p.value(t0()), Some(2.0));
    }

    #[test]
    fn test_scoped_property() {
        let interval = TimeInterval::closed(t0(), add_seconds(t0(), 5.0));
        let p = ScopedProperty::new(interval, constant(7.0f64));
        assert_eq!(p.value(add_seconds(t0(), 1.0)), Some(7.0));
        assert_eq!(p.value(add_seconds(t0(), 6.0)), None);
    }
}
