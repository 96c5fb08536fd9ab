//! Wallshift-Common: Shared types, errors, and naming helpers.
//!
//! This crate provides common functionality used across wallshift:
//!
//! - **Data model**: [`WallpaperCandidate`], [`ImageSource`], [`DeviceDescriptor`]
//!   and [`AppliedRecord`]
//! - **Cache naming**: the `<id>.jpg` convention shared by the cache and history
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use wallshift_common::{DeviceDescriptor, ImageSource, Error, Result};
//! use wallshift_common::paths::cache_file_name;
//!
//! let device = DeviceDescriptor::new(1080, 1920).unwrap();
//! assert_eq!(device.aspect(), 1920.0 / 1080.0);
//!
//! assert_eq!(ImageSource::Unsplash.to_string(), "unsplash");
//! assert_eq!(cache_file_name("unsplash_abc"), "unsplash_abc.jpg");
//!
//! let err: Result<DeviceDescriptor> = DeviceDescriptor::new(0, 1920);
//! assert!(matches!(err, Err(Error::InvalidDevice { width: 0, .. })));
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
