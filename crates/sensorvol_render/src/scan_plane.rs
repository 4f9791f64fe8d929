//! Scan-plane animator
//!
//! A scan plane sweeps periodically across the pyramid's aperture. Its
//! orientation is a pure function of elapsed time, mode and the volume's
//! half-angles; [`ScanClock`] supplies the elapsed time.

use sensorvol_core::time::seconds_between;
use sensorvol_core::{ScanPlaneMode, SimTime};
use sensorvol_math::mat3::{self, Mat3};

/// Plane orientation for one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanPlaneState {
    pub x_half_angle: f64,
    pub y_half_angle: f64,
    /// Rotation applied between the volume's model matrix and its radius scale
    pub rotation: Mat3,
}

/// Fraction of the current period in `[0, 1)`
///
/// A non-positive or non-finite period has no sweep and reports phase 0.
pub fn phase(period: f64, elapsed: f64) -> f64 {
    if !(period.is_finite() && period > 0.0) || !elapsed.is_finite() {
        return 0.0;
    }
    ((elapsed % period) / period).max(0.0)
}

/// Compute the plane's angles and rotation after `elapsed` seconds
pub fn sweep(
    mode: ScanPlaneMode,
    period: f64,
    elapsed: f64,
    x_half_angle: f64,
    y_half_angle: f64,
) -> ScanPlaneState {
    let phase = phase(period, elapsed);
    match mode {
        ScanPlaneMode::Horizontal => {
            let angle = 2.0 * y_half_angle * phase - y_half_angle;
            ScanPlaneState {
                x_half_angle: (angle.cos() * x_half_angle.tan()).atan(),
                y_half_angle: angle,
                rotation: mat3::from_rotation_x(angle),
            }
        }
        ScanPlaneMode::Vertical => {
            let angle = 2.0 * x_half_angle * phase - x_half_angle;
            ScanPlaneState {
                x_half_angle: angle,
                y_half_angle: (angle.cos() * y_half_angle.tan()).atan(),
                rotation: mat3::from_rotation_y(angle),
            }
        }
    }
}

/// Elapsed-time source for the sweep
///
/// The anchor is the first observed time. Stepping backwards re-anchors the
/// clock, so elapsed time is never negative.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScanClock {
    anchor: Option<SimTime>,
    last: Option<SimTime>,
}

impl ScanClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock already anchored at `time`
    pub fn anchored_at(time: SimTime) -> Self {
        Self { anchor: Some(time), last: Some(time) }
    }

    pub fn anchor(&self) -> Option<SimTime> {
        self.anchor
    }

    /// Seconds since the anchor, observing `now`
    pub fn elapsed(&mut self, now: SimTime) -> f64 {
        let rewound = match (self.anchor, self.last) {
            (Some(anchor), Some(last)) => now < anchor || now < last,
            _ => true,
        };
        if rewound {
            log::trace!("scan clock anchored at {}", now);
            self.anchor = Some(now);
        }
        self.last = Some(now);

        match self.anchor {
            Some(anchor) => seconds_between(now, anchor).max(0.0),
            None => 0.0,
        }
    }

    /// Forget the anchor; the next observation starts a new sweep
    pub fn reset(&mut self) {
        self.anchor = None;
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorvol_core::time::{add_seconds, parse_time};

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn t0() -> SimTime {
        parse_time("2024-01-01T00:00:00Z").unwrap()
    }

    #[test]
    fn test_phase_range() {
        for elapsed in [0.0, 0.5, 3.0, 9.999, 10.0, 25.0, 1e6] {
            let p = phase(10.0, elapsed);
            assert!((0.0..1.0).contains(&p), "phase {} for elapsed {}", p, elapsed);
        }
        assert!(approx_eq(phase(10.0, 25.0), 0.5));
    }

    #[test]
    fn test_phase_degenerate_period() {
        assert_eq!(phase(0.0, 5.0), 0.0);
        assert_eq!(phase(-1.0, 5.0), 0.0);
        assert_eq!(phase(f64::NAN, 5.0), 0.0);
        assert_eq!(phase(f64::INFINITY, 5.0), 0.0);
        // negative elapsed time clamps
        assert_eq!(phase(10.0, -3.0), 0.0);
    }

    #[test]
    fn test_horizontal_sweep_endpoints() {
        let (x, y) = (0.4, 0.3);
        let start = sweep(ScanPlaneMode::Horizontal, 10.0, 0.0, x, y);
        assert!(approx_eq(start.y_half_angle, -y));
        assert!(approx_eq(start.x_half_angle, ((-y).cos() * x.tan()).atan()));
        assert_eq!(start.rotation, mat3::from_rotation_x(-y));

        let middle = sweep(ScanPlaneMode::Horizontal, 10.0, 5.0, x, y);
        assert!(approx_eq(middle.y_half_angle, 0.0));
        assert!(approx_eq(middle.x_half_angle, x));
    }

    #[test]
    fn test_vertical_sweep_rotates_about_y() {
        let (x, y) = (0.4, 0.3);
        let state = sweep(ScanPlaneMode::Vertical, 4.0, 1.0, x, y);
        let angle = 2.0 * x * 0.25 - x;
        assert!(approx_eq(state.x_half_angle, angle));
        assert!(approx_eq(state.y_half_angle, (angle.cos() * y.tan()).atan()));
        assert_eq!(state.rotation, mat3::from_rotation_y(angle));
    }

    #[test]
    fn test_sweep_stays_inside_aperture() {
        let (x, y) = (0.7, 0.5);
        for step in 0..40 {
            let state = sweep(ScanPlaneMode::Horizontal, 10.0, step as f64 * 0.25, x, y);
            assert!(state.y_half_angle >= -y - EPSILON && state.y_half_angle < y);
            assert!(state.x_half_angle <= x + EPSILON);
        }
    }

    #[test]
    fn test_clock_anchors_on_first_observation() {
        let mut clock = ScanClock::new();
        assert_eq!(clock.elapsed(t0()), 0.0);
        assert!(approx_eq(clock.elapsed(add_seconds(t0(), 2.5)), 2.5));
        assert_eq!(clock.anchor(), Some(t0()));
    }

    #[test]
    fn test_clock_resets_when_time_goes_backwards() {
        let mut clock = ScanClock::anchored_at(t0());
        assert!(approx_eq(clock.elapsed(add_seconds(t0(), 8.0)), 8.0));

        // earlier than last seen, later than the anchor
        let rewound = add_seconds(t0(), 3.0);
        assert_eq!(clock.elapsed(rewound), 0.0);
        assert_eq!(clock.anchor(), Some(rewound));

        // earlier than the anchor
        let before = add_seconds(t0(), -5.0);
        assert_eq!(clock.elapsed(before), 0.0);
        assert!(approx_eq(clock.elapsed(add_seconds(before, 1.0)), 1.0));
    }

    #[test]
    fn test_clock_reset() {
        let mut clock = ScanClock::anchored_at(t0());
        clock.reset();
        assert_eq!(clock.anchor(), None);
        assert_eq!(clock.elapsed(add_seconds(t0(), 4.0)), 0.0);
    }
}
