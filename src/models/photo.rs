//! Photo record as returned by the listing endpoints.

use serde::{Deserialize, Serialize};

/// A photo listed by the API.
///
/// Only `id` and `links.download` drive the download pipeline; everything
/// else is carried along untouched. Both decode to empty strings when
/// absent so one bad record fails its own download, not the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Photo {
    /// Unique photo identifier
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub width: u32,

    #[serde(default)]
    pub height: u32,

    /// Dominant color as a hex string
    #[serde(default)]
    pub color: Option<String>,

    #[serde(default)]
    pub likes: u64,

    #[serde(default)]
    pub liked_by_user: bool,

    /// Owner of the photo
    #[serde(default)]
    pub user: PhotoOwner,

    #[serde(default)]
    pub current_user_collections: Vec<serde_json::Value>,

    #[serde(default)]
    pub urls: PhotoUrls,

    #[serde(default)]
    pub categories: Vec<serde_json::Value>,

    #[serde(default)]
    pub links: PhotoLinks,
}

impl Photo {
    /// URL of the original image binary.
    pub fn download_url(&self) -> &str {
        &self.links.download
    }

    /// Whether the record carries what a download needs.
    pub fn is_downloadable(&self) -> bool {
        !self.id.trim().is_empty() && !self.links.download.trim().is_empty()
    }

    /// File name the photo is stored under.
    pub fn file_name(&self) -> String {
        format!("{}.jpg", self.id)
    }
}

/// Owner of a photo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PhotoOwner {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_image: ProfileImage,
    #[serde(default)]
    pub links: OwnerLinks,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProfileImage {
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub large: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OwnerLinks {
    #[serde(default, rename = "self")]
    pub self_link: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub photos: String,
    #[serde(default)]
    pub likes: String,
}

/// Rendered image sizes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PhotoUrls {
    #[serde(default)]
    pub raw: String,
    #[serde(default)]
    pub full: String,
    #[serde(default)]
    pub regular: String,
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub thumb: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PhotoLinks {
    #[serde(default, rename = "self")]
    pub self_link: String,
    #[serde(default)]
    pub html: String,
    /// Download location for the original image
    #[serde(default)]
    pub download: String,
}
