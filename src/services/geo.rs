use crate::models::Coordinate;

/// Mean Earth radius used by the spherical approximation
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres using the haversine formula
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    let c = 2.0 * a.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

pub fn distance_between(from: &Coordinate, to: &Coordinate) -> f64 {
    distance_km(from.latitude, from.longitude, to.latitude, to.longitude)
}

/// Latitude/longitude box.
///
/// `min_longitude > max_longitude` means the box crosses the antimeridian and
/// covers `min_longitude..=180` plus `-180..=max_longitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Coarse box that contains every point within `radius_km` of `center`.
    ///
    /// Only a pre-filter: corners lie outside the radius, so callers still
    /// check the exact distance.
    pub fn around(center: &Coordinate, radius_km: f64) -> Self {
        let angular = radius_km.max(0.0) / EARTH_RADIUS_KM;
        let lat_change = angular.to_degrees();
        let min_latitude = (center.latitude - lat_change).max(-90.0);
        let max_latitude = (center.latitude + lat_change).min(90.0);

        let full_longitude = Self {
            min_latitude,
            max_latitude,
            min_longitude: -180.0,
            max_longitude: 180.0,
        };

        // A circle reaching a pole spans every meridian
        if min_latitude <= -90.0 || max_latitude >= 90.0 {
            return full_longitude;
        }

        let ratio = angular.sin() / center.latitude.to_radians().cos();
        if !ratio.is_finite() || ratio >= 1.0 {
            return full_longitude;
        }
        let lon_change = ratio.asin().to_degrees();

        let mut min_longitude = center.longitude - lon_change;
        let mut max_longitude = center.longitude + lon_change;
        if min_longitude < -180.0 {
            min_longitude += 360.0;
        }
        if max_longitude > 180.0 {
            max_longitude -= 360.0;
        }

        Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.min_longitude > self.max_longitude
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        let latitude_ok = (self.min_latitude..=self.max_latitude).contains(&point.latitude);
        let longitude_ok = if self.crosses_antimeridian() {
            point.longitude >= self.min_longitude || point.longitude <= self.max_longitude
        } else {
            (self.min_longitude..=self.max_longitude).contains(&point.longitude)
        };
        latitude_ok && longitude_ok
    }
}
