//! Geographic primitives used for proximity matching.
//!
//! Distances are great-circle (haversine) metres on a spherical Earth using
//! the IUGG mean radius. That is within 0.5% of the ellipsoidal answer at the
//! few-kilometre ranges linkups operate over.

use serde::{Deserialize, Serialize};

/// Largest radius a linkup may search, in metres.
pub const MAX_SEARCH_RADIUS_METERS: f64 = 5_000.0;
/// Radius applied when a create request omits or mangles `search_radius`.
pub const DEFAULT_SEARCH_RADIUS_METERS: f64 = 500.0;
/// Radius used by the nearby listing when `max_radius` is absent or invalid.
pub const DEFAULT_NEARBY_RADIUS_METERS: f64 = 5_000.0;

const EARTH_MEAN_RADIUS_METERS: f64 = 6_371_008.8;

/// Reasons a coordinate pair is rejected.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("latitude must be a finite number between -90 and 90")]
    Latitude,
    #[error("longitude must be a finite number between -180 and 180")]
    Longitude,
}

/// WGS84 coordinate pair with validated bounds.
///
/// # Examples
/// ```
/// use linkup_backend::domain::Coordinate;
///
/// let ann_arbor = Coordinate::new(42.28, -83.74).unwrap();
/// assert_eq!(ann_arbor.latitude(), 42.28);
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Validate and construct a coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude);
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude);
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other` in metres.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlng = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();
        EARTH_MEAN_RADIUS_METERS * c
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            latitude: f64,
            longitude: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.latitude, raw.longitude).map_err(serde::de::Error::custom)
    }
}

/// Search radius for a linkup, always within `(0, MAX_SEARCH_RADIUS_METERS]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SearchRadius(f64);

impl SearchRadius {
    /// Clamp a requested radius for linkup creation.
    ///
    /// Missing, non-finite, non-positive, and oversized values all become
    /// [`DEFAULT_SEARCH_RADIUS_METERS`] rather than an error.
    ///
    /// # Examples
    /// ```
    /// use linkup_backend::domain::SearchRadius;
    ///
    /// assert_eq!(SearchRadius::from_requested(Some(1200.0)).meters(), 1200.0);
    /// assert_eq!(SearchRadius::from_requested(Some(9000.0)).meters(), 500.0);
    /// assert_eq!(SearchRadius::from_requested(None).meters(), 500.0);
    /// ```
    #[must_use]
    pub fn from_requested(requested: Option<f64>) -> Self {
        Self::within_bounds(requested).unwrap_or(Self(DEFAULT_SEARCH_RADIUS_METERS))
    }

    /// Radius for the nearby listing; invalid input becomes the listing default.
    #[must_use]
    pub fn for_nearby(requested: Option<f64>) -> Self {
        requested
            .filter(|r| r.is_finite() && *r > 0.0)
            .map_or(Self(DEFAULT_NEARBY_RADIUS_METERS), Self)
    }

    /// Rehydrate a stored radius, enforcing the same bounds as creation.
    #[must_use]
    pub fn within_bounds(meters: Option<f64>) -> Option<Self> {
        meters
            .filter(|r| r.is_finite() && *r > 0.0 && *r <= MAX_SEARCH_RADIUS_METERS)
            .map(Self)
    }

    #[must_use]
    pub fn meters(&self) -> f64 {
        self.0
    }
}
