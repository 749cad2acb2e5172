#![warn(clippy::all, missing_docs)]

//! Core client logic for the Eja-iCe operator console.
//!
//! This crate hosts the HTTP transport and session lifecycle, the typed
//! contracts for each backend resource, derived-state computation for the
//! dashboard and list views, client-side export, and the card-scanner
//! ingestion path used by the terminal UI and any future frontends.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod listview;
pub mod models;
pub mod report;
pub mod scan;
pub mod session;

pub use client::ApiClient;
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use models::{
    Account, Card, Direction, StorageEntry, Transaction, UserInfo, UserProfile, UserType,
};
pub use session::{Session, SessionEvent, SessionStore};
