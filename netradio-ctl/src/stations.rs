//! Station directory
//!
//! Ordered, read-only collection of known stations loaded at startup from a
//! TOML station file:
//!
//! ```toml
//! [[station]]
//! name = "Radio One"
//! url = "http://stream.example.org/radioone.mp3"
//! icon = "radioone.png"
//! ```
//!
//! Names are the lookup key exactly as the client sends them (case-sensitive).
//! Icon paths use a separate slug, see [`icon_slug`].

use crate::error::{Error, Result};
use crate::icons::is_reserved_slug;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// A named, addressable radio stream source
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Station {
    pub name: String,

    #[serde(rename = "url")]
    pub stream_url: String,

    /// Icon file relative to the icon directory; empty when the station has none
    #[serde(rename = "icon", default)]
    pub icon_ref: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct StationFile {
    #[serde(rename = "station", default)]
    stations: Vec<Station>,
}

/// Stations in insertion order with a name index
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    stations: Vec<Station>,
    index: HashMap<String, usize>,
}

impl StationDirectory {
    /// Build a directory; later duplicates of a name are dropped with a warning
    pub fn new(stations: impl IntoIterator<Item = Station>) -> Self {
        let mut directory = Self::default();
        for station in stations {
            if directory.index.contains_key(&station.name) {
                warn!("Duplicate station name {:?} ignored", station.name);
                continue;
            }
            let slug = icon_slug(&station.name);
            if is_reserved_slug(&slug) {
                warn!(
                    "Station {:?} maps to reserved path /{}; its icon cannot be served",
                    station.name, slug
                );
            }
            directory
                .index
                .insert(station.name.clone(), directory.stations.len());
            directory.stations.push(station);
        }
        directory
    }

    /// Load the station file.
    ///
    /// A missing or corrupt file yields an empty directory and a warning; the
    /// backend still starts and serves status queries.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(directory) => {
                info!(
                    "Loaded {} stations from {}",
                    directory.len(),
                    path.display()
                );
                directory
            }
            Err(e) => {
                warn!(
                    "Could not load stations from {}: {}; starting with an empty directory",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: StationFile = toml::from_str(&content).map_err(netradio_common::Error::from)?;
        Ok(Self::new(file.stations))
    }

    /// Write the directory back in the same format [`StationDirectory::load`] reads
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = StationFile {
            stations: self.stations.clone(),
        };
        let content = toml::to_string_pretty(&file).map_err(netradio_common::Error::from)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Case-sensitive exact match on the station name
    pub fn lookup(&self, name: &str) -> Result<&Station> {
        self.index
            .get(name)
            .map(|&i| &self.stations[i])
            .ok_or_else(|| Error::StationNotFound(name.to_string()))
    }

    /// `(name, icon_ref)` pairs in insertion order
    pub fn list(&self) -> impl Iterator<Item = (&str, &str)> {
        self.stations
            .iter()
            .map(|s| (s.name.as_str(), s.icon_ref.as_str()))
    }

    /// Station whose icon slug equals `slug`
    pub fn find_by_slug(&self, slug: &str) -> Option<&Station> {
        self.stations.iter().find(|s| icon_slug(&s.name) == slug)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// Serializes as a JSON object `name -> icon_ref` in directory order
pub struct StationListing<'a>(pub &'a StationDirectory);

impl Serialize for StationListing<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, icon) in self.0.list() {
            map.serialize_entry(name, icon)?;
        }
        map.end()
    }
}

/// Icon path for a station name: lowercase, all whitespace removed.
///
/// `"Radio One"` is served at `/radioone`.
pub fn icon_slug(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn station(name: &str, url: &str, icon: &str) -> Station {
        Station {
            name: name.to_string(),
            stream_url: url.to_string(),
            icon_ref: icon.to_string(),
        }
    }

    #[test]
    fn test_icon_slug() {
        assert_eq!(icon_slug("Radio One"), "radioone");
        assert_eq!(icon_slug("  SWR3\tPop "), "swr3pop");
        assert_eq!(icon_slug("ÄÖÜ FM"), "äöüfm");
        assert_eq!(icon_slug(""), "");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let dir = StationDirectory::new([station("Radio One", "http://a", "a.png")]);
        assert!(dir.lookup("Radio One").is_ok());
        assert!(matches!(
            dir.lookup("radio one"),
            Err(Error::StationNotFound(name)) if name == "radio one"
        ));
    }

    #[test]
    fn test_duplicates_keep_first() {
        let dir = StationDirectory::new([
            station("A", "http://first", ""),
            station("B", "http://b", ""),
            station("A", "http://second", ""),
        ]);
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.lookup("A").unwrap().stream_url, "http://first");
    }

    #[test]
    fn test_listing_preserves_order() {
        let dir = StationDirectory::new([
            station("Zulu", "http://z", "z.png"),
            station("Alpha", "http://a", "a.png"),
        ]);
        let json = serde_json::to_string(&StationListing(&dir)).unwrap();
        assert_eq!(json, r#"{"Zulu":"z.png","Alpha":"a.png"}"#);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let dir = StationDirectory::load(&tmp.path().join("missing.toml"));
        assert!(dir.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stations.toml");
        std::fs::write(&path, "[[station]]\nname = 42\n").unwrap();
        assert!(StationDirectory::load(&path).is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("stations.toml");
        let dir = StationDirectory::new([
            station("Radio One", "http://a", "radioone.png"),
            station("Radio Two", "http://b", ""),
        ]);

        dir.save(&path).unwrap();
        let loaded = StationDirectory::load(&path);

        assert_eq!(loaded.stations(), dir.stations());
    }

    #[test]
    fn test_reserved_slug_station_is_still_listed() {
        let dir = StationDirectory::new([station("Sender", "http://s", "sender.png")]);
        assert_eq!(dir.len(), 1);
        assert!(dir.lookup("Sender").is_ok());
    }

    #[test]
    fn test_find_by_slug() {
        let dir = StationDirectory::new([station("Radio One", "http://a", "r1.png")]);
        assert_eq!(dir.find_by_slug("radioone").unwrap().name, "Radio One");
        assert!(dir.find_by_slug("radiotwo").is_none());
    }
}
