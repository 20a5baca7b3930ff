use crate::models::{ChargePoint, Position, RankedPoint};
use rand::Rng;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two positions, in kilometers.
pub fn haversine_km(from: Position, to: Position) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Ranks charging points by distance from `origin`, nearest first.
///
/// The sort is stable, so points at the same distance keep the order in which
/// they were given.
pub fn rank_by_distance(
    origin: Position,
    points: impl IntoIterator<Item = ChargePoint>,
) -> Vec<RankedPoint> {
    let mut ranked: Vec<RankedPoint> = points
        .into_iter()
        .map(|point| RankedPoint {
            distance: haversine_km(origin, point.position),
            queue_length: point.queue.len(),
            id: point.id,
            position: point.position,
        })
        .collect();
    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked
}

/// A uniformly random position within the valid coordinate ranges.
pub fn random_position(rng: &mut impl Rng) -> Position {
    Position {
        latitude: rng.gen_range(-90.0..=90.0),
        longitude: rng.gen_range(-180.0..=180.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, latitude: f64, longitude: f64, queue: &[&str]) -> ChargePoint {
        ChargePoint {
            id: id.into(),
            position: Position {
                latitude,
                longitude,
            },
            queue: queue.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn test_random_position_in_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let position = random_position(&mut rng);
            assert!(Position::new(position.latitude, position.longitude).is_ok());
        }
    }

    #[test]
    fn test_haversine_known_distances() {
        let origin = Position {
            latitude: 0.0,
            longitude: 0.0,
        };
        assert_eq!(haversine_km(origin, origin), 0.0);

        // One degree of longitude on the equator
        let one_degree = haversine_km(
            origin,
            Position {
                latitude: 0.0,
                longitude: 1.0,
            },
        );
        assert!((one_degree - 111.195).abs() < 0.01);

        // Pole to pole is half the circumference
        let poles = haversine_km(
            Position {
                latitude: 90.0,
                longitude: 0.0,
            },
            Position {
                latitude: -90.0,
                longitude: 0.0,
            },
        );
        assert!((poles - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_rank_nearest_first() {
        let origin = Position {
            latitude: 0.0,
            longitude: 0.0,
        };
        let ranked = rank_by_distance(
            origin,
            vec![
                point("far", 0.0, 5.0, &[]),
                point("near", 0.0, 1.0, &["car-1", "car-2"]),
            ],
        );
        assert_eq!(ranked[0].id, "near");
        assert_eq!(ranked[0].queue_length, 2);
        assert_eq!(ranked[1].id, "far");
        assert!(ranked[0].distance < ranked[1].distance);
    }

    #[test]
    fn test_rank_ties_keep_enumeration_order() {
        let origin = Position {
            latitude: 0.0,
            longitude: 0.0,
        };
        let ranked = rank_by_distance(
            origin,
            vec![
                point("east", 0.0, 2.0, &[]),
                point("close", 0.0, 0.5, &[]),
                point("west", 0.0, -2.0, &[]),
            ],
        );
        let ids: Vec<&str> = ranked.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["close", "east", "west"]);
    }
}
