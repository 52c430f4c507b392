//! Event store feed publisher library.
//!
//! This crate primarily ships a `feed-server` binary, but we expose a small
//! library surface to enable integration testing and reuse.

pub mod api;
pub mod cipher;
pub mod config;
pub mod db;
pub mod feed;
pub mod server;
pub mod state;
