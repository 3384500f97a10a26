use crate::models::driver::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Rough kilometres per degree of arc at the equator.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Straight-line distance in raw degrees, treating lat/lng as a flat plane.
pub fn planar_degrees(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let delta_lat = a.lat - b.lat;
    let delta_lng = a.lng - b.lng;

    (delta_lat * delta_lat + delta_lng * delta_lng).sqrt()
}

/// Planar degree distance scaled to approximate kilometres.
///
/// This is what matching and fares are pinned to. It is not geodesic and says
/// nothing about road distance.
pub fn planar_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    planar_degrees(a, b) * KM_PER_DEGREE
}

/// Great-circle distance. Only used for the driver-facing nearby-rides radius.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

pub fn is_valid_point(point: &GeoPoint) -> bool {
    point.lat.is_finite()
        && point.lng.is_finite()
        && (-90.0..=90.0).contains(&point.lat)
        && (-180.0..=180.0).contains(&point.lng)
}
