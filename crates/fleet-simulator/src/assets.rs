//! Route asset loading from JSON files.
//!
//! Each file holds one route: `{ "name", "color"?, "coordinates": [[lon, lat], ...] }`
//! or the line-list form `{ "name", "route": [[[lon, lat], ...]] }`.

use std::fs;
use std::path::{Path, PathBuf};

use fleet_domain::{LoadError, RouteSource};
use tracing::info;

use crate::catalog::RouteCatalog;

/// Parse a single route definition. `origin` names the input in errors.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] on malformed JSON or non-numeric values.
pub fn parse_route_json(origin: &str, json: &str) -> Result<RouteSource, LoadError> {
    serde_json::from_str(json).map_err(|source| LoadError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Load the given route files, in order, into a catalog.
///
/// # Errors
///
/// Returns the first I/O, parse or validation error.
pub fn load_route_files<P: AsRef<Path>>(paths: &[P]) -> Result<RouteCatalog, LoadError> {
    let sources = paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let json = fs::read_to_string(path).map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_route_json(&path.display().to_string(), &json)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let catalog = RouteCatalog::load(sources)?;
    info!(routes = catalog.len(), "Route catalog loaded");
    Ok(catalog)
}

/// Load every `*.json` file in `dir`, sorted by file name.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be listed, otherwise the
/// same errors as [`load_route_files`].
pub fn load_route_dir(dir: impl AsRef<Path>) -> Result<RouteCatalog, LoadError> {
    let dir = dir.as_ref();
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?
        .into_iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    load_route_files(&paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fleet-assets-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_routes_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/routes")
    }

    #[test]
    fn test_load_sample_routes() {
        let catalog = load_route_dir(sample_routes_dir()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert!(catalog.routes().iter().all(|r| r.len() >= 2));
    }

    #[test]
    fn test_load_dir_sorted_and_filtered() {
        let dir = scratch_dir("sorted");
        fs::write(dir.join("b.json"), r#"{"name":"b","coordinates":[[1,1]]}"#).unwrap();
        fs::write(dir.join("a.json"), r#"{"name":"a","route":[[[0,0],[0,1]]]}"#).unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let catalog = load_route_dir(&dir).unwrap();
        let names: Vec<_> = catalog.routes().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(catalog.get(0).unwrap().color(), "#FF0000");
        assert_eq!(catalog.get(1).unwrap().color(), "#00AA00");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_parse_errors_name_the_file() {
        let err = parse_route_json("route9.json", r#"{"name":"x","coordinates":[["a",1]]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("route9.json"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_route_files(&["/definitely/not/here.json"]);
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}
