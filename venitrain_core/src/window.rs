//! Bounded, time-ordered store of accepted telemetry samples.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::telemetry::TelemetrySample;

/// Nominal device sample rate.
pub const NOMINAL_SAMPLE_RATE_HZ: usize = 10;
/// Default capacity: ten seconds at the nominal rate.
pub const DEFAULT_WINDOW_CAPACITY: usize = NOMINAL_SAMPLE_RATE_HZ * 10;

/// Placeholder rendered for an aggregate over an empty window.
pub const EMPTY_SENTINEL: &str = "—";

/// Min/max pair over the current window contents; `None` when the window is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Display wrapper rendering a range with one decimal or the empty sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeDisplay(pub Option<ValueRange>);

impl fmt::Display for RangeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(r) => write!(f, "{:.1} - {:.1}", r.min, r.max),
            None => write!(f, "{EMPTY_SENTINEL} - {EMPTY_SENTINEL}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<TelemetrySample>,
    capacity: usize,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_WINDOW_CAPACITY)
    }
}

impl RollingWindow {
    /// Capacity is clamped to at least one sample.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push to the back, evicting from the front beyond capacity.
    pub fn append(&mut self, sample: TelemetrySample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Ordered read-only view, oldest first.
    pub fn snapshot(&self) -> impl ExactSizeIterator<Item = &TelemetrySample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<TelemetrySample> {
        self.samples.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<&TelemetrySample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn angle_range(&self) -> Option<ValueRange> {
        self.range_of(|s| s.angle_processed)
    }

    pub fn pressure_range(&self) -> Option<ValueRange> {
        self.range_of(|s| s.pressure)
    }

    fn range_of(&self, field: impl Fn(&TelemetrySample) -> f64) -> Option<ValueRange> {
        self.samples.iter().map(field).fold(None, |acc, v| {
            Some(match acc {
                None => ValueRange { min: v, max: v },
                Some(r) => ValueRange {
                    min: r.min.min(v),
                    max: r.max.max(v),
                },
            })
        })
    }
}

/// Recommended insertion angle band in degrees.
pub const OPTIMAL_ANGLE_DEG: (f64, f64) = (15.0, 30.0);
const GAUGE_CENTER_DEG: f64 = 22.5;
const GAUGE_SPAN_DEG: f64 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleZone {
    Shallow,
    Optimal,
    Steep,
}

/// Classify a needle angle against the recommended band (inclusive).
pub fn angle_zone(angle_deg: f64) -> AngleZone {
    let (lo, hi) = OPTIMAL_ANGLE_DEG;
    if angle_deg < lo {
        AngleZone::Shallow
    } else if angle_deg > hi {
        AngleZone::Steep
    } else {
        AngleZone::Optimal
    }
}

/// Gauge position in percent with the optimal band centred at 50.
pub fn angle_gauge_percent(angle_deg: f64) -> f64 {
    let normalized = (angle_deg - GAUGE_CENTER_DEG) / GAUGE_SPAN_DEG + 0.5;
    (normalized * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: usize) -> TelemetrySample {
        TelemetrySample {
            time_s: i as f64 * 0.1,
            angle_raw: i as f64,
            pressure: 50.0 + i as f64,
            angle_processed: 20.0 - i as f64,
            vein_touch: i % 2 == 0,
        }
    }

    #[test]
    fn keeps_last_capacity_samples_oldest_first() {
        let mut w = RollingWindow::default();
        for i in 0..105 {
            w.append(sample(i));
        }
        assert_eq!(w.len(), 100);
        let times: Vec<f64> = w.snapshot().map(|s| s.angle_raw).collect();
        assert_eq!(times.first(), Some(&5.0));
        assert_eq!(times.last(), Some(&104.0));
        assert!(times.windows(2).all(|p| p[0] < p[1]));
    }

    #[test]
    fn ranges_are_none_when_empty() {
        let w = RollingWindow::default();
        assert_eq!(w.angle_range(), None);
        assert_eq!(RangeDisplay(w.pressure_range()).to_string(), "— - —");
    }

    #[test]
    fn ranges_track_contents() {
        let mut w = RollingWindow::with_capacity(3);
        for i in 0..5 {
            w.append(sample(i));
        }
        assert_eq!(
            w.pressure_range(),
            Some(ValueRange {
                min: 52.0,
                max: 54.0
            })
        );
        assert_eq!(
            w.angle_range(),
            Some(ValueRange {
                min: 16.0,
                max: 18.0
            })
        );
        assert_eq!(RangeDisplay(w.angle_range()).to_string(), "16.0 - 18.0");
    }

    #[test]
    fn angle_guidance() {
        assert_eq!(angle_zone(14.9), AngleZone::Shallow);
        assert_eq!(angle_zone(15.0), AngleZone::Optimal);
        assert_eq!(angle_zone(30.0), AngleZone::Optimal);
        assert_eq!(angle_zone(31.0), AngleZone::Steep);
        assert_eq!(angle_gauge_percent(22.5), 50.0);
        assert_eq!(angle_gauge_percent(-90.0), 0.0);
        assert_eq!(angle_gauge_percent(90.0), 100.0);
    }
}
