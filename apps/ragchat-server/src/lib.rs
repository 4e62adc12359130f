//! HTTP façade over the query engine plus startup wiring shared by the
//! `ragchat-server` subcommands.

pub mod api;
pub mod app;

pub use api::{router, ApiError, AppState};
pub use app::{build_engine, ingest, open_index};
