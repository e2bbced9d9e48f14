//! Point-in-polygon test for service-area geofences.
//!
//! Polygons are stored GeoJSON-style (`[lng, lat]` pairs, ring closed by
//! repeating the first vertex) and converted to [`GeoPoint`] rings here.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

/// Added to every edge's latitude span before dividing, so horizontal edges
/// never divide by zero. This shifts crossings by a negligible amount; points
/// lying exactly on an edge have no guaranteed result.
pub const EDGE_EPSILON: f64 = 0.000_000_1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
    lat.is_finite() && lng.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

/// Drops the closing vertex when the ring repeats its first point.
fn open_ring(polygon: &[GeoPoint]) -> &[GeoPoint] {
    match (polygon.first(), polygon.last()) {
        (Some(first), Some(last)) if polygon.len() > 1 && first == last => {
            &polygon[..polygon.len() - 1]
        }
        _ => polygon,
    }
}

pub fn vertex_count(polygon: &[GeoPoint]) -> usize {
    open_ring(polygon).len()
}

/// Even-odd ray casting. A ring with fewer than three vertices covers nothing.
pub fn is_inside(point: GeoPoint, polygon: &[GeoPoint]) -> bool {
    let ring = open_ring(polygon);
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].lng, ring[i].lat);
        let (xj, yj) = (ring[j].lng, ring[j].lat);

        let crosses = (yi > point.lat) != (yj > point.lat)
            && point.lng < (xj - xi) * (point.lat - yi) / (yj - yi + EDGE_EPSILON) + xi;
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Accepts a GeoJSON `Polygon` object or a bare ring of `[lng, lat]` pairs.
/// Anything unreadable yields an empty ring.
pub fn polygon_from_geojson(value: &Value) -> Vec<GeoPoint> {
    let ring = match value {
        Value::Object(map) => map
            .get("coordinates")
            .and_then(|c| c.get(0))
            .and_then(Value::as_array),
        Value::Array(arr) => Some(arr),
        _ => None,
    };

    let Some(ring) = ring else {
        return Vec::new();
    };

    let mut points = Vec::with_capacity(ring.len());
    for pair in ring {
        let lng = pair.get(0).and_then(Value::as_f64);
        let lat = pair.get(1).and_then(Value::as_f64);
        match (lat, lng) {
            (Some(lat), Some(lng)) => points.push(GeoPoint::new(lat, lng)),
            _ => return Vec::new(),
        }
    }
    points
}

pub fn polygon_to_geojson(points: &[GeoPoint]) -> Value {
    let mut ring: Vec<Value> = points.iter().map(|p| json!([p.lng, p.lat])).collect();
    if let (Some(first), Some(last)) = (points.first(), points.last())
        && first != last
    {
        ring.push(json!([first.lng, first.lat]));
    }
    json!({ "type": "Polygon", "coordinates": [ring] })
}

pub fn validate_polygon(points: &[GeoPoint]) -> Result<(), String> {
    if vertex_count(points) < 3 {
        return Err("Polygon needs at least 3 vertices".to_string());
    }
    if points.iter().any(|p| !is_valid_coordinate(p.lat, p.lng)) {
        return Err("Polygon contains out-of-range coordinates".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(32.00, 34.70),
            GeoPoint::new(32.00, 34.71),
            GeoPoint::new(32.01, 34.71),
            GeoPoint::new(32.01, 34.70),
            GeoPoint::new(32.00, 34.70),
        ]
    }

    #[test]
    fn test_points_inside_square() {
        let poly = square();
        assert!(is_inside(GeoPoint::new(32.005, 34.705), &poly));
        assert!(is_inside(GeoPoint::new(32.0001, 34.7001), &poly));
        assert!(is_inside(GeoPoint::new(32.0099, 34.7099), &poly));
    }

    #[test]
    fn test_points_outside_each_side() {
        let poly = square();
        // south, north, west, east
        assert!(!is_inside(GeoPoint::new(31.999, 34.705), &poly));
        assert!(!is_inside(GeoPoint::new(32.011, 34.705), &poly));
        assert!(!is_inside(GeoPoint::new(32.005, 34.699), &poly));
        assert!(!is_inside(GeoPoint::new(32.005, 34.711), &poly));
        assert!(!is_inside(GeoPoint::new(0.0, 0.0), &poly));
    }

    #[test]
    fn test_degenerate_polygons_fail_closed() {
        let p = GeoPoint::new(32.005, 34.705);
        assert!(!is_inside(p, &[]));
        assert!(!is_inside(p, &[GeoPoint::new(32.0, 34.7)]));
        assert!(!is_inside(
            p,
            &[GeoPoint::new(32.0, 34.7), GeoPoint::new(32.01, 34.71)]
        ));
        // two distinct vertices plus the closing repeat is still a segment
        assert!(!is_inside(
            p,
            &[
                GeoPoint::new(32.0, 34.7),
                GeoPoint::new(32.01, 34.71),
                GeoPoint::new(32.0, 34.7),
            ]
        ));
    }

    #[test]
    fn test_concave_polygon() {
        // U shape opening to the north
        let poly = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 3.0),
            GeoPoint::new(3.0, 3.0),
            GeoPoint::new(3.0, 2.0),
            GeoPoint::new(1.0, 2.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(3.0, 1.0),
            GeoPoint::new(3.0, 0.0),
        ];
        assert!(is_inside(GeoPoint::new(2.0, 0.5), &poly));
        assert!(is_inside(GeoPoint::new(2.0, 2.5), &poly));
        assert!(!is_inside(GeoPoint::new(2.0, 1.5), &poly));
    }

    #[test]
    fn test_geojson_parsing_uses_lng_lat_order() {
        let value = json!({
            "type": "Polygon",
            "coordinates": [[[34.70, 32.00], [34.71, 32.00], [34.71, 32.01], [34.70, 32.01], [34.70, 32.00]]]
        });
        let ring = polygon_from_geojson(&value);
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[1], GeoPoint::new(32.00, 34.71));
        assert_eq!(vertex_count(&ring), 4);
        assert!(is_inside(GeoPoint::new(32.005, 34.705), &ring));
    }

    #[test]
    fn test_geojson_garbage_is_empty() {
        assert!(polygon_from_geojson(&json!(null)).is_empty());
        assert!(polygon_from_geojson(&json!({"type": "Polygon"})).is_empty());
        assert!(polygon_from_geojson(&json!({"coordinates": [[[1.0, "x"]]]})).is_empty());
    }

    #[test]
    fn test_polygon_to_geojson_closes_ring() {
        let open = &square()[..4];
        let value = polygon_to_geojson(open);
        let coords = value["coordinates"][0].as_array().unwrap();
        assert_eq!(coords.len(), 5);
        assert_eq!(coords[0], coords[4]);
        assert_eq!(polygon_from_geojson(&value).len(), 5);
    }

    #[test]
    fn test_validate_polygon() {
        assert!(validate_polygon(&square()).is_ok());
        assert!(validate_polygon(&square()[..2]).is_err());
        let mut bad = square();
        bad[1].lat = 120.0;
        assert!(validate_polygon(&bad).is_err());
    }
}
