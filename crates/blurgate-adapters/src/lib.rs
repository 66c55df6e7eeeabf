//! Blurgate Adapters - filesystem and storage adapters for blurgate.
//!
//! This crate provides:
//! - [`FsImageSource`], the filesystem [`ImageSource`](blurgate_core::ImageSource)
//! - [`ModelStore`], the classifier artifact directory and local installer

pub mod fs;
pub mod models;

pub use fs::FsImageSource;
pub use models::{default_models_dir, InstalledModel, ModelStore, ProgressCallback};
