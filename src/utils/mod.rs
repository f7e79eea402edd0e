//! Utility functions and helpers.

pub mod http;
pub mod link;

use std::path::PathBuf;

use url::Url;

use crate::error::Result;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> Result<Url> {
    Ok(base.join(href)?)
}

/// Default download directory for the current platform.
pub fn default_download_dir() -> PathBuf {
    let home = dirs::home_dir();
    if cfg!(target_os = "macos") {
        if let Some(pictures) = dirs::picture_dir() {
            return pictures.join("Unsplash");
        }
    } else if cfg!(any(target_os = "linux", target_os = "freebsd")) {
        if let Some(home) = home {
            return home.join("unsplash");
        }
    }
    PathBuf::from(".")
}

/// Cache directory used for throwaway wallpaper downloads.
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("unsplash-dl"))
        .unwrap_or_else(|| std::env::temp_dir().join("unsplash-dl"))
}
