//! kiln-lib: Core types and logic for Kiln
//!
//! This crate provides the fundamental pieces of the staged build pipeline:
//! - `Recipe`: immutable build configuration loaded from `kiln.toml`
//! - `ManifestPair`: dependency manifest + lockfile, the inputs that key the cache
//! - `stage`: the three pipeline stages (dependencies, application, assembly)
//! - `store`: the content-addressed dependency cache
//! - `image`: runtime image metadata and minimal-surface rules

pub mod consts;
pub mod exec;
pub mod gc;
pub mod image;
pub mod init;
pub mod manifest;
pub mod pipeline;
pub mod platform;
pub mod recipe;
pub mod stage;
pub mod store;
pub mod store_lock;
pub mod stub;
pub mod util;
