//! # GraphQL Output Types
//!
//! Object type definitions for GraphQL responses.

use async_graphql::{Json, Object, SimpleObject};
use chrono::{DateTime, Utc};

use fleet_domain as domain;

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Geographic coordinate
#[derive(Debug, Clone, Copy, SimpleObject)]
pub struct Coordinate {
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Latitude in decimal degrees
    pub latitude: f64,
}

impl From<domain::Coordinate> for Coordinate {
    fn from(c: domain::Coordinate) -> Self {
        Self {
            longitude: c.longitude,
            latitude: c.latitude,
        }
    }
}

// =============================================================================
// FLEET TYPES
// =============================================================================

/// Current state of one delivery truck
#[derive(Debug, Clone)]
pub struct Truck {
    pub id: u32,
    pub color: String,
    pub route_name: String,
    pub position: Coordinate,
    pub bearing: f64,
    pub tick: u64,
    pub updated_at: DateTime<Utc>,
}

#[Object]
impl Truck {
    /// Stable truck identifier (fleet position)
    async fn id(&self) -> u32 {
        self.id
    }

    /// Display color of the truck's route
    async fn color(&self) -> &str {
        &self.color
    }

    /// Name of the route being driven
    async fn route_name(&self) -> &str {
        &self.route_name
    }

    /// Displayed position, including GPS jitter
    async fn position(&self) -> Coordinate {
        self.position
    }

    /// Heading in degrees (0-360, 0 = North)
    async fn bearing(&self) -> f64 {
        self.bearing
    }

    /// Eight-point compass heading
    async fn compass(&self) -> &'static str {
        compass_point(self.bearing)
    }

    /// Ticks accepted for this truck since the engine started
    async fn tick(&self) -> u64 {
        self.tick
    }

    /// Time of the truck's last tick
    async fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl From<&domain::TruckFeature> for Truck {
    fn from(f: &domain::TruckFeature) -> Self {
        Self {
            id: f.id,
            color: f.color.clone(),
            route_name: f.route.clone(),
            position: f.position.into(),
            bearing: f.bearing,
            tick: f.tick,
            updated_at: f.updated_at,
        }
    }
}

/// Fleet-wide snapshot
#[derive(Debug, Clone, SimpleObject)]
pub struct FleetSnapshot {
    /// Number of ticks applied since the engine started
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    /// One entry per truck, ordered by id
    pub trucks: Vec<Truck>,
}

impl From<&domain::Snapshot> for FleetSnapshot {
    fn from(s: &domain::Snapshot) -> Self {
        Self {
            version: s.version,
            updated_at: s.updated_at,
            trucks: s.features().map(Truck::from).collect(),
        }
    }
}

/// Closed-loop delivery route
#[derive(Debug, Clone)]
pub struct Route {
    inner: domain::Route,
}

#[Object]
impl Route {
    async fn name(&self) -> &str {
        self.inner.name()
    }

    async fn color(&self) -> &str {
        self.inner.color()
    }

    /// Number of points in the loop
    async fn length(&self) -> u64 {
        self.inner.len() as u64
    }

    /// True for single-point routes, whose trucks never move
    async fn degenerate(&self) -> bool {
        self.inner.is_degenerate()
    }

    async fn coordinates(&self) -> Vec<Coordinate> {
        self.inner.coordinates().iter().copied().map(Coordinate::from).collect()
    }

    /// GeoJSON LineString feature, closed back to the first point
    async fn geojson(&self) -> Json<serde_json::Value> {
        Json(self.inner.to_feature())
    }
}

impl From<&domain::Route> for Route {
    fn from(r: &domain::Route) -> Self {
        Self { inner: r.clone() }
    }
}

/// Map a bearing to N, NE, E, SE, S, SW, W or NW.
fn compass_point(bearing: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let sector = ((bearing.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    POINTS[sector]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compass_point() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(22.4), "N");
        assert_eq!(compass_point(45.0), "NE");
        assert_eq!(compass_point(90.0), "E");
        assert_eq!(compass_point(225.0), "SW");
        assert_eq!(compass_point(350.0), "N");
    }
}
