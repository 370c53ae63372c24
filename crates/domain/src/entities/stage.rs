//! Trail stages and live position

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{GeoLocation, InvalidCoordinates};

/// A raw waypoint as stored in the stage file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StagePoint {
    pub lat: f64,
    pub lon: f64,
}

/// One day's stage of the trail, with its waypoints in walking order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(rename = "punkte")]
    pub points: Vec<StagePoint>,
}

impl Stage {
    /// Validated waypoint locations in walking order
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinates` if any stored waypoint is out of range.
    pub fn locations(&self) -> Result<Vec<GeoLocation>, InvalidCoordinates> {
        self.points
            .iter()
            .map(|p| GeoLocation::new(p.lat, p.lon))
            .collect()
    }

    /// Shortest distance from `position` to any waypoint of this stage
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinates` if any stored waypoint is out of range.
    pub fn distance_km(&self, position: &GeoLocation) -> Result<f64, InvalidCoordinates> {
        let locations = self.locations()?;
        Ok(locations
            .iter()
            .map(|loc| loc.distance_km(position))
            .fold(f64::INFINITY, f64::min))
    }
}

/// A live position reported by a GPS tracker share page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentPosition {
    pub location: GeoLocation,
    pub timestamp: DateTime<Utc>,
    pub source_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage() -> Stage {
        Stage {
            name: "Calenzana - Ortu di u Piobbu".to_string(),
            points: vec![
                StagePoint {
                    lat: 42.5089,
                    lon: 8.8568,
                },
                StagePoint {
                    lat: 42.4731,
                    lon: 8.9204,
                },
            ],
        }
    }

    #[test]
    fn locations_validate_waypoints() {
        let locations = stage().locations().unwrap();
        assert_eq!(locations.len(), 2);
        assert!((locations[0].latitude() - 42.5089).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_waypoint_is_rejected() {
        let mut bad = stage();
        bad.points.push(StagePoint {
            lat: 95.0,
            lon: 0.0,
        });
        assert!(bad.locations().is_err());
    }

    #[test]
    fn distance_uses_nearest_waypoint() {
        let stage = stage();
        let near_second = GeoLocation::new_unchecked(42.4731, 8.9204);
        let distance = stage.distance_km(&near_second).unwrap();
        assert!(distance < 0.001);
    }

    #[test]
    fn stage_deserializes_from_stage_file_shape() {
        let json = r#"{"name": "Vizzavona - E Capannelle", "punkte": [{"lat": 42.1281, "lon": 9.1339}]}"#;
        let stage: Stage = serde_json::from_str(json).unwrap();
        assert_eq!(stage.name, "Vizzavona - E Capannelle");
        assert_eq!(stage.points.len(), 1);
    }
}
