//! HTTP surface of the media ingestion service.
//!
//! Exposed as a library so integration tests can build the router against
//! an isolated storage root.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod services;
pub mod setup;
pub mod state;
