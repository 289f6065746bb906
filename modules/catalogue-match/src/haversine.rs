/// Earth radius in meters, matching the reference implementation's constant.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two lat/lng points, in meters.
pub fn haversine_distance_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1_r, lat2_r) = (lat1.to_radians(), lat2.to_radians());
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero_distance() {
        let d = haversine_distance_m(55.9533, -3.1883, 55.9533, -3.1883);
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn edinburgh_to_glasgow_is_roughly_correct() {
        // Edinburgh city centre to Glasgow city centre, ~66km.
        let d = haversine_distance_m(55.9533, -3.1883, 55.8642, -4.2518);
        assert!((60_000.0..75_000.0).contains(&d), "distance was {d}");
    }

    #[test]
    fn close_coordinates_are_small_distance() {
        let d = haversine_distance_m(55.9533, -3.1883, 55.9534, -3.1884);
        assert!(d < 200.0, "distance was {d}");
    }
}
