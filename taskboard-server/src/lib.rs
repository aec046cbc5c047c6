//! `TaskBoard` persistence server library.
//!
//! Exposes the task table and HTTP routes for use in tests and embedding.
//! The server holds the authoritative task records in memory and serves
//! them over the JSON REST contract the client store reconciles against.

pub mod config;
pub mod routes;
pub mod store;
