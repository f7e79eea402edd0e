// src/wallpaper.rs

//! Desktop wallpaper rotation over a directory of downloaded photos.
//!
//! Only macOS is supported; rotation is configured through System Events
//! with `osascript`.

use std::path::Path;

use tokio::process::Command;

use crate::error::{AppError, Result};

const OSASCRIPT: &str = "/usr/bin/osascript";

/// Seconds between wallpaper changes.
const CHANGE_INTERVAL_SECS: u32 = 86_400;

/// Whether wallpaper rotation can be configured on this platform.
pub fn is_supported() -> bool {
    cfg!(target_os = "macos")
}

/// AppleScript enabling random rotation through `dir`.
pub fn rotation_script(dir: &Path) -> String {
    let folder = dir.display().to_string().replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        r#"
tell application "System Events"
    tell current desktop
        set picture rotation to 1 -- (0=off, 1=interval, 2=login, 3=sleep)
        set random order to true
        set pictures folder to POSIX file "{folder}"
        set change interval to {CHANGE_INTERVAL_SECS} -- seconds
    end tell
end tell
"#
    )
}

/// Rotate the desktop wallpaper through the photos in `dir`.
pub async fn set_wallpaper_dir(dir: &Path) -> Result<()> {
    if !is_supported() {
        return Err(AppError::wallpaper(
            "Only macOS is supported for wallpaper setting",
        ));
    }

    let dir = std::path::absolute(dir)?;
    log::info!("Setting wallpaper dir to {}", dir.display());

    let output = Command::new(OSASCRIPT)
        .arg("-e")
        .arg(rotation_script(&dir))
        .output()
        .await?;

    if !output.status.success() {
        return Err(AppError::wallpaper(format!(
            "osascript exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}
