//! Shared test utilities for the ucd-store workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`backend`]: [`FaultyBackend`](backend::FaultyBackend), a memory backend
//!   with injectable per-path failures
//! - [`ucd`]: realistic UCD file contents and store layouts
//! - [`store`]: [`TestStoreDir`](store::TestStoreDir), a temporary on-disk store

pub mod backend;
pub mod store;
pub mod ucd;
