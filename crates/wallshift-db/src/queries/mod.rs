//! Database query modules.
//!
//! - history: wallpaper history, applied timestamps, and cached paths

pub mod history;
