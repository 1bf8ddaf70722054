use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Circular boundary around an office coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub center: GeoPoint,
    pub radius_meters: f64,
}

impl Geofence {
    pub fn new(center: GeoPoint, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
        }
    }

    pub fn distance_to(&self, point: GeoPoint) -> f64 {
        haversine_distance_meters(point, self.center)
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        inside_geofence(
            point.lat,
            point.lng,
            self.center.lat,
            self.center.lng,
            self.radius_meters,
        )
    }
}

/// Great-circle distance in meters. Inputs are degrees and are not validated.
pub fn haversine_distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + (d_lng / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// True when the point lies within `radius_meters` of the office. The boundary is inclusive.
pub fn inside_geofence(
    point_lat: f64,
    point_lng: f64,
    office_lat: f64,
    office_lng: f64,
    radius_meters: f64,
) -> bool {
    let distance = haversine_distance_meters(
        GeoPoint::new(point_lat, point_lng),
        GeoPoint::new(office_lat, office_lng),
    );
    distance <= radius_meters
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFICE: GeoPoint = GeoPoint {
        lat: 30.0444,
        lng: 31.2357,
    };

    #[test]
    fn identical_point_with_zero_radius_is_inside() {
        assert!(inside_geofence(
            OFFICE.lat, OFFICE.lng, OFFICE.lat, OFFICE.lng, 0.0
        ));
    }

    #[test]
    fn boundary_distance_is_inclusive() {
        let point = GeoPoint::new(30.0450, 31.2370);
        let radius = haversine_distance_meters(point, OFFICE);
        assert!(radius > 0.0);
        assert!(inside_geofence(
            point.lat, point.lng, OFFICE.lat, OFFICE.lng, radius
        ));
    }

    #[test]
    fn just_past_boundary_is_outside() {
        let point = GeoPoint::new(30.0450, 31.2370);
        let distance = haversine_distance_meters(point, OFFICE);
        let radius = distance - 1e-6;
        assert!(!inside_geofence(
            point.lat, point.lng, OFFICE.lat, OFFICE.lng, radius
        ));
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let distance = haversine_distance_meters(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((distance - 111_194.9).abs() < 1.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(51.5007, -0.1246);
        let b = GeoPoint::new(48.8584, 2.2945);
        let ab = haversine_distance_meters(a, b);
        let ba = haversine_distance_meters(b, a);
        assert!((ab - ba).abs() < 1e-6);
        assert!((ab - 340_000.0).abs() < 5_000.0);
    }

    #[test]
    fn geofence_contains_matches_free_function() {
        let fence = Geofence::new(OFFICE, 150.0);
        let near = GeoPoint::new(30.0450, 31.2360);
        let far = GeoPoint::new(30.0600, 31.2357);
        assert!(fence.contains(near));
        assert!(!fence.contains(far));
        assert!(fence.distance_to(far) > 150.0);
    }
}
