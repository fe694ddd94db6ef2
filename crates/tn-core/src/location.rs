//! Timestamped player positions.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

use crate::GeoPoint;

/// A geographic position plus the instant it was recorded.
///
/// Identity is the coordinate only: two locations at the same point compare
/// equal whatever their timestamps.  The timestamp is metadata used by
/// movement strategies to turn a speed cap into a distance budget.
///
/// Coordinates are compared by bit pattern (with `-0.0` folded into `0.0`)
/// so that `Eq` and `Hash` stay consistent.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub point:     GeoPoint,
    pub timestamp: DateTime<Utc>,
}

impl Location {
    /// A location at `(lat, lon)` stamped with the current time.
    pub fn now(lat: f64, lon: f64) -> Self {
        Self::at(lat, lon, Utc::now())
    }

    /// A location at `(lat, lon)` stamped with `timestamp`.
    pub fn at(lat: f64, lon: f64, timestamp: DateTime<Utc>) -> Self {
        Self { point: GeoPoint::new(lat, lon), timestamp }
    }

    pub fn from_point(point: GeoPoint, timestamp: DateTime<Utc>) -> Self {
        Self { point, timestamp }
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.point.lat
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.point.lon
    }

    /// Same coordinate, new timestamp.
    pub fn with_timestamp(self, timestamp: DateTime<Utc>) -> Self {
        Self { point: self.point, timestamp }
    }

    /// Seconds from this location's timestamp to `now`.  Negative when `now`
    /// lies before the timestamp.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> f64 {
        let delta = now - self.timestamp;
        match delta.num_microseconds() {
            Some(us) => us as f64 / 1e6,
            None => delta.num_milliseconds() as f64 / 1e3,
        }
    }

    /// Haversine distance to `other` in metres.
    pub fn distance_m(&self, other: &Location) -> f64 {
        self.point.distance_m(other.point)
    }

    fn key(&self) -> (u64, u64) {
        (canonical_bits(self.point.lat), canonical_bits(self.point.lon))
    }
}

#[inline]
fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.point, self.timestamp.to_rfc3339())
    }
}
