// src/models/mod.rs

//! Domain models for the downloader.
//!
//! This module contains the data structures shared across the application,
//! organized by their primary purpose.

mod config;
mod photo;
mod query;

// Re-export all public types
pub use config::{ACCESS_KEY_ENV, ApiConfig, AuthConfig, Config, DownloadConfig};
pub use photo::{OwnerLinks, Photo, PhotoLinks, PhotoOwner, PhotoUrls, ProfileImage};
pub use query::{ListingQuery, Order, Source};
