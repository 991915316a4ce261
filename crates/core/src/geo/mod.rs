//! Geographic positions, bounds and projection to local metres

mod projector;

pub use projector::CoordinateProjector;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius in metres used for great-circle distances
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon")]
    pub longitude: f64,
}

impl LatLon {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in metres (haversine formula).
    pub fn distance_to(&self, other: &LatLon) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Axis-aligned lat/lon bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min: LatLon,
    pub max: LatLon,
}

impl GeoBounds {
    pub fn new(min: LatLon, max: LatLon) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every position, or `None` for an empty iterator.
    pub fn from_positions<'a, I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a LatLon>,
    {
        let mut iter = positions.into_iter();
        let first = *iter.next()?;
        let mut bounds = GeoBounds::new(first, first);
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    /// Grow the box to include `p`
    pub fn extend(&mut self, p: &LatLon) {
        self.min.latitude = self.min.latitude.min(p.latitude);
        self.min.longitude = self.min.longitude.min(p.longitude);
        self.max.latitude = self.max.latitude.max(p.latitude);
        self.max.longitude = self.max.longitude.max(p.longitude);
    }

    pub fn lat_span(&self) -> f64 {
        self.max.latitude - self.min.latitude
    }

    pub fn lon_span(&self) -> f64 {
        self.max.longitude - self.min.longitude
    }

    pub fn contains(&self, p: &LatLon) -> bool {
        p.latitude >= self.min.latitude
            && p.latitude <= self.max.latitude
            && p.longitude >= self.min.longitude
            && p.longitude <= self.max.longitude
    }
}

impl fmt::Display for GeoBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.min, self.max)
    }
}
