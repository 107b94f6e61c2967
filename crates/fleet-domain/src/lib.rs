//! # Delivery Fleet Tracker - Domain Model
//!
//! Core value objects and entities for the simulated delivery fleet: route
//! coordinates, closed-loop routes, per-truck features and the fleet-wide
//! snapshot. These types are shared by the simulation engine, the API layer
//! and any map consumer.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Colors handed out to routes that do not declare one, by fleet position.
pub const DEFAULT_PALETTE: [&str; 3] = ["#FF0000", "#00AA00", "#8585FF"];

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Geographic coordinate in degrees (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }

    /// Shift by the given deltas on each axis.
    #[must_use]
    pub fn offset(&self, d_lon: f64, d_lat: f64) -> Self {
        Self::new(self.longitude + d_lon, self.latitude + d_lat)
    }

    /// Initial great-circle bearing towards `other`, see [`bearing`].
    #[must_use]
    pub fn bearing_to(&self, other: &Self) -> f64 {
        bearing(self, other)
    }

    /// GeoJSON position (`[lon, lat]`).
    #[must_use]
    pub fn to_position(&self) -> Value {
        json!([self.longitude, self.latitude])
    }
}

/// Forward azimuth from `from` to `to` on a spherical earth, in `[0, 360)`.
///
/// Coincident points give `atan2(0, 0) = 0`, so a truck parked on a
/// single-point route always reports a heading of due north.
#[must_use]
pub fn bearing(from: &Coordinate, to: &Coordinate) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let delta_lambda = (to.longitude - from.longitude).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    (x.atan2(y).to_degrees() + 360.0) % 360.0
}

// =============================================================================
// ROUTES
// =============================================================================

/// Raw route definition as delivered by the asset layer.
///
/// Accepts both `coordinates: [[lon, lat], ...]` and the line-list form
/// `route: [[[lon, lat], ...], ...]`, of which only the first line is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSource {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Vec<Vec<Vec<f64>>>>,
}

impl RouteSource {
    pub fn new(name: impl Into<String>, color: impl Into<String>, coordinates: &[(f64, f64)]) -> Self {
        Self {
            name: name.into(),
            color: Some(color.into()),
            coordinates: Some(coordinates.iter().map(|&(lon, lat)| vec![lon, lat]).collect()),
            route: None,
        }
    }

    /// Validate and convert into an immutable [`Route`].
    ///
    /// `index` is the position in the fleet and picks the fallback color.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the name is blank, the coordinate array is
    /// missing or empty, or any position is short or non-finite.
    pub fn into_route(self, index: usize) -> Result<Route, LoadError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(LoadError::EmptyName { index });
        }

        let positions = match (self.coordinates, self.route) {
            (Some(coords), _) => coords,
            (None, Some(lines)) => lines.into_iter().next().unwrap_or_default(),
            (None, None) => return Err(LoadError::MissingCoordinates { route: name }),
        };

        let mut coordinates = Vec::with_capacity(positions.len());
        for (position, values) in positions.into_iter().enumerate() {
            let [lon, lat, ..] = values.as_slice() else {
                return Err(LoadError::MalformedPosition { route: name, position });
            };
            coordinates.push(Coordinate::new(*lon, *lat));
        }

        let color = self
            .color
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()].to_string());

        Route::new(name, color, coordinates)
    }
}

impl From<Route> for RouteSource {
    fn from(route: Route) -> Self {
        Self {
            name: route.name,
            color: Some(route.color),
            coordinates: Some(
                route
                    .coordinates
                    .iter()
                    .map(|c| vec![c.longitude, c.latitude])
                    .collect(),
            ),
            route: None,
        }
    }
}

/// Immutable closed-loop route; the last point connects back to the first.
///
/// Always non-empty with finite coordinates. Deserializing goes through
/// [`RouteSource::into_route`], so serde cannot bypass the checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RouteSource", into = "RouteSource")]
pub struct Route {
    name: String,
    color: String,
    coordinates: Vec<Coordinate>,
}

impl TryFrom<RouteSource> for Route {
    type Error = LoadError;

    fn try_from(source: RouteSource) -> Result<Self, Self::Error> {
        source.into_route(0)
    }
}

impl Route {
    /// # Errors
    ///
    /// Returns [`LoadError::EmptyRoute`] when `coordinates` is empty and
    /// [`LoadError::NonFinite`] for the first NaN or infinite point.
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        coordinates: Vec<Coordinate>,
    ) -> Result<Self, LoadError> {
        let name = name.into();
        if coordinates.is_empty() {
            return Err(LoadError::EmptyRoute { route: name });
        }
        if let Some(position) = coordinates.iter().position(|c| !c.is_finite()) {
            return Err(LoadError::NonFinite { route: name, position });
        }
        Ok(Self {
            name,
            color: color.into(),
            coordinates,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    #[must_use]
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Coordinate> {
        self.coordinates.get(index)
    }

    /// A single-point route never moves.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.coordinates.len() == 1
    }

    /// GeoJSON `LineString` feature of the loop, closed back to its start.
    #[must_use]
    pub fn to_feature(&self) -> Value {
        let mut line: Vec<Value> = self.coordinates.iter().map(Coordinate::to_position).collect();
        if let Some(first) = self.coordinates.first() {
            line.push(first.to_position());
        }
        json!({
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": line },
            "properties": { "name": self.name, "color": self.color },
        })
    }
}

// =============================================================================
// SNAPSHOT TYPES
// =============================================================================

/// Published state of one truck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckFeature {
    pub id: u32,
    pub color: String,
    pub route: String,
    pub position: Coordinate,
    /// Heading in degrees (0-360, 0 = North)
    pub bearing: f64,
    /// Ticks accepted for this truck; 0 while parked.
    #[serde(default)]
    pub tick: u64,
    pub updated_at: DateTime<Utc>,
}

impl TruckFeature {
    /// GeoJSON `Point` feature, shaped like the map layer's truck source.
    #[must_use]
    pub fn to_feature(&self) -> Value {
        json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": self.position.to_position() },
            "properties": {
                "id": self.id,
                "color": self.color,
                "bearing": self.bearing,
                "route": self.route,
                "tick": self.tick,
            },
        })
    }
}

/// Fleet-wide state at a point in time, keyed by truck id.
///
/// `version` increases by one with every accepted tick, across all trucks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    features: BTreeMap<u32, TruckFeature>,
}

impl Snapshot {
    pub fn new(features: impl IntoIterator<Item = TruckFeature>) -> Self {
        Self {
            version: 0,
            updated_at: Utc::now(),
            features: features.into_iter().map(|f| (f.id, f)).collect(),
        }
    }

    /// Replace the feature stored under `feature.id`.
    pub fn upsert(&mut self, feature: TruckFeature) {
        self.updated_at = feature.updated_at;
        self.version += 1;
        self.features.insert(feature.id, feature);
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&TruckFeature> {
        self.features.get(&id)
    }

    /// Features in ascending id order.
    pub fn features(&self) -> impl Iterator<Item = &TruckFeature> {
        self.features.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// GeoJSON `FeatureCollection` of truck points.
    #[must_use]
    pub fn to_feature_collection(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": self.features().map(TruckFeature::to_feature).collect::<Vec<_>>(),
        })
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Route loading errors. All of them abort startup.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("No route sources provided")]
    NoRoutes,

    #[error("Route #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("Route '{route}' has no coordinate array")]
    MissingCoordinates { route: String },

    #[error("Route '{route}' has no coordinates")]
    EmptyRoute { route: String },

    #[error("Route '{route}': position {position} is not a [lon, lat] pair")]
    MalformedPosition { route: String, position: usize },

    #[error("Route '{route}': position {position} is not finite")]
    NonFinite { route: String, position: usize },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(id: u32, lon: f64, lat: f64) -> TruckFeature {
        TruckFeature {
            id,
            color: "#FF0000".to_string(),
            route: format!("route-{id}"),
            position: Coordinate::new(lon, lat),
            bearing: 0.0,
            tick: 0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bearing_same_point_is_zero() {
        for (lon, lat) in [(0.0, 0.0), (5.0, 5.0), (-83.76, 42.28), (179.9, -89.0)] {
            let c = Coordinate::new(lon, lat);
            assert_eq!(bearing(&c, &c), 0.0);
        }
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!((bearing(&origin, &Coordinate::new(0.0, 1.0)) - 0.0).abs() < 1e-9);
        assert!((bearing(&origin, &Coordinate::new(1.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(&origin, &Coordinate::new(0.0, -1.0)) - 180.0).abs() < 1e-9);
        assert!((bearing(&origin, &Coordinate::new(-1.0, 0.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_range() {
        let points = [
            Coordinate::new(0.0, 0.0),
            Coordinate::new(-83.761868, 42.281902),
            Coordinate::new(-83.7619, 42.2819),
            Coordinate::new(179.0, 10.0),
            Coordinate::new(-179.0, -10.0),
            Coordinate::new(12.5, 89.9),
            Coordinate::new(0.0, -0.0),
        ];
        for a in &points {
            for b in &points {
                let deg = a.bearing_to(b);
                assert!((0.0..360.0).contains(&deg), "bearing {deg} out of range");
            }
        }
    }

    #[test]
    fn test_route_source_into_route() {
        let source = RouteSource::new("Loop A", "#123456", &[(0.0, 0.0), (0.0, 1.0)]);
        let route = source.into_route(0).unwrap();
        assert_eq!(route.name(), "Loop A");
        assert_eq!(route.color(), "#123456");
        assert_eq!(route.len(), 2);
        assert!(!route.is_degenerate());
    }

    #[test]
    fn test_route_source_line_list_and_palette() {
        let source: RouteSource = serde_json::from_str(
            r#"{ "name": "route2", "route": [[[1.0, 2.0], [3.0, 4.0, 250.0]], [[9.0, 9.0]]] }"#,
        )
        .unwrap();
        let route = source.into_route(4).unwrap();
        assert_eq!(route.coordinates(), &[Coordinate::new(1.0, 2.0), Coordinate::new(3.0, 4.0)]);
        assert_eq!(route.color(), "#00AA00");
    }

    #[test]
    fn test_route_source_rejects_malformed() {
        let empty_name = RouteSource::new("  ", "#fff", &[(0.0, 0.0)]);
        assert!(matches!(empty_name.into_route(2), Err(LoadError::EmptyName { index: 2 })));

        let missing = RouteSource {
            name: "x".into(),
            ..RouteSource::default()
        };
        assert!(matches!(missing.into_route(0), Err(LoadError::MissingCoordinates { .. })));

        let empty = RouteSource::new("x", "#fff", &[]);
        assert!(matches!(empty.into_route(0), Err(LoadError::EmptyRoute { .. })));

        let short = RouteSource {
            name: "x".into(),
            coordinates: Some(vec![vec![0.0, 0.0], vec![1.0]]),
            ..RouteSource::default()
        };
        assert!(matches!(
            short.into_route(0),
            Err(LoadError::MalformedPosition { position: 1, .. })
        ));

        let nan = RouteSource::new("x", "#fff", &[(f64::NAN, 0.0)]);
        assert!(matches!(nan.into_route(0), Err(LoadError::NonFinite { position: 0, .. })));
    }

    #[test]
    fn test_route_source_non_numeric_json_fails_to_parse() {
        let parsed = serde_json::from_str::<RouteSource>(
            r#"{ "name": "bad", "coordinates": [["a", "b"]] }"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_route_new_rejects_empty_and_non_finite() {
        assert!(matches!(
            Route::new("ghost", "#000", Vec::new()),
            Err(LoadError::EmptyRoute { .. })
        ));

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = Route::new(
                "bad",
                "#000",
                vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, bad)],
            );
            assert!(matches!(result, Err(LoadError::NonFinite { position: 1, .. })));
        }
    }

    #[test]
    fn test_route_deserialize_validates() {
        let empty = serde_json::from_str::<Route>(r##"{"name":"ghost","color":"#000","coordinates":[]}"##);
        assert!(empty.is_err());

        let route: Route =
            serde_json::from_str(r##"{"name":"ok","color":"#000","coordinates":[[1.0,2.0],[3.0,4.0]]}"##)
                .unwrap();
        assert_eq!(route.len(), 2);

        let json = serde_json::to_string(&route).unwrap();
        assert_eq!(serde_json::from_str::<Route>(&json).unwrap(), route);
    }

    #[test]
    fn test_route_feature_is_closed() {
        let route = Route::new(
            "loop",
            "#fff",
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0), Coordinate::new(1.0, 1.0)],
        )
        .unwrap();
        let feature = route.to_feature();
        let line = feature["geometry"]["coordinates"].as_array().unwrap();
        assert_eq!(line.len(), 4);
        assert_eq!(line[0], line[3]);
    }

    #[test]
    fn test_snapshot_upsert_keeps_one_feature_per_truck() {
        let mut snapshot = Snapshot::new([feature(0, 0.0, 0.0), feature(1, 1.0, 1.0)]);
        assert_eq!(snapshot.version, 0);

        snapshot.upsert(feature(1, 2.0, 2.0));
        snapshot.upsert(feature(1, 3.0, 3.0));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.get(1).unwrap().position, Coordinate::new(3.0, 3.0));
        assert_eq!(snapshot.get(0).unwrap().position, Coordinate::new(0.0, 0.0));
    }

    #[test]
    fn test_snapshot_feature_collection() {
        let snapshot = Snapshot::new([feature(0, -83.76, 42.28)]);
        let fc = snapshot.to_feature_collection();
        assert_eq!(fc["type"], "FeatureCollection");
        assert_eq!(fc["features"][0]["geometry"]["type"], "Point");
        assert_eq!(fc["features"][0]["geometry"]["coordinates"][0], -83.76);
        assert_eq!(fc["features"][0]["properties"]["id"], 0);
    }
}
