//! Station icon lookup
//!
//! The control panel requests `/<slug>` (see [`icon_slug`]) and falls back
//! to `/default` itself when a request fails. The backend mirrors that: any
//! miss is answered with the configured default icon, and only a missing
//! default icon produces a 404.
//!
//! Fixed API routes take priority over `/<slug>`, and `/default` is the
//! client's fallback path. A station whose slug is one of
//! [`RESERVED_SLUGS`] (e.g. "Sender" or "Default") therefore never gets its
//! own icon; the directory warns about such names when it is built.
//!
//! [`icon_slug`]: crate::stations::icon_slug

use crate::stations::StationDirectory;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Lowercase paths already taken by fixed routes or the client fallback.
/// Route matching is case-sensitive, so camelCase routes cannot collide.
pub const RESERVED_SLUGS: &[&str] = &["sender", "connect", "health", "default"];

pub fn is_reserved_slug(slug: &str) -> bool {
    RESERVED_SLUGS.contains(&slug)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct IconStore {
    dir: PathBuf,
    default_icon: String,
}

impl IconStore {
    pub fn new(dir: impl Into<PathBuf>, default_icon: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            default_icon: default_icon.into(),
        }
    }

    /// Icon for the station whose slug is `slug`, else the default icon
    pub async fn resolve(&self, directory: &StationDirectory, slug: &str) -> Option<Icon> {
        let station_icon = Some(slug)
            .filter(|slug| !is_reserved_slug(slug))
            .and_then(|slug| directory.find_by_slug(slug))
            .map(|station| station.icon_ref.as_str())
            .filter(|icon| !icon.is_empty());

        if let Some(icon_ref) = station_icon {
            if let Some(icon) = self.read(icon_ref).await {
                return Some(icon);
            }
            debug!("Icon {:?} for /{} unavailable, using default", icon_ref, slug);
        }

        self.read(&self.default_icon).await
    }

    async fn read(&self, icon_ref: &str) -> Option<Icon> {
        let path = self.contained_path(icon_ref)?;
        let bytes = tokio::fs::read(&path).await.ok()?;
        Some(Icon {
            content_type: content_type(&path),
            bytes,
        })
    }

    /// Reject references that would escape the icon directory
    fn contained_path(&self, icon_ref: &str) -> Option<PathBuf> {
        let relative = Path::new(icon_ref);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        contained.then(|| self.dir.join(relative))
    }
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
