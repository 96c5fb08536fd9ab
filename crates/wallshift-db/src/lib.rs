//! Wallshift-DB: Wallpaper history schema, migrations, and queries
//!
//! This crate provides the durable history store for wallshift using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use wallshift_db::pool::{init_pool, get_conn};
//! use wallshift_db::queries::history;
//!
//! let pool = init_pool("/var/lib/wallshift/wallshift.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! history::mark_applied(&conn, "unsplash_abc", 1_700_000_000_000).unwrap();
//! let applied = history::applied_ids(&conn).unwrap();
//! println!("{} wallpapers applied so far", applied.len());
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
