//! Bodega Server Library
//!
//! This crate exposes the server's modules for integration tests.
//! The server binary is in main.rs.
//!
//! # Modules
//!
//! - `upload`: session registry, batch ingest and the finalize/merge engine
//! - `storage`: byte-sink backends (local filesystem, S3-compatible)
//! - `routes`: HTTP transport adapter
//! - `config` / `state`: configuration and shared application state

pub mod config;
pub mod routes;
pub mod state;
pub mod storage;
pub mod upload;
