//! Wallshift - multi-provider wallpaper selection
//!
//! This library crate exposes the pipeline pieces for the binary and for
//! integration testing.

pub mod cache;
pub mod config;
pub mod history;
pub mod providers;
pub mod scoring;
pub mod search;
pub mod service;
