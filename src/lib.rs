// src/lib.rs

//! Unsplash photo listing and bulk download library

pub mod auth;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
#[cfg(feature = "wallpaper")]
pub mod wallpaper;
