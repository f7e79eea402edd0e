//! Storage for downloaded photos.
//!
//! ## Directory Structure
//!
//! ```text
//! {target_dir}/
//! ├── abc123.jpg
//! └── def456.jpg
//! ```
//!
//! One file per photo, named after the photo id. No manifest is written.

pub mod local;

// Re-export for convenience
pub use local::LocalStorage;
