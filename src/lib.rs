//! # Quad
//!
//! Activity aggregation and content search for a university forum, usable both
//! as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! quad = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quad::config::ServerConfig;
//! use quad::server::{AppState, create_router};
//! use quad::store::{SqliteStore, Store, seed_default_roles};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//! seed_default_roles(&store).unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), &config));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! The engine entry points work on any [`store::Store`]:
//! [`search::search`], [`activity::user_stats`] and [`activity::user_activity`].
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `quad` binary. Disable with `default-features = false`.

pub mod activity;
pub mod auth;
pub mod config;
pub mod error;
pub mod search;
pub mod server;
pub mod store;
pub mod types;
