//! Service layer for the downloader.
//!
//! This module contains the API-facing logic for:
//! - Cursor-following pagination (`Paginator`)
//! - Photo listing by user, likes or collection (`PhotoClient`)

pub mod paginator;
mod photos;

pub use paginator::{Page, PageRequest, Paginator, paginate};
pub use photos::PhotoClient;
