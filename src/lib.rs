//! Menuhub front-ends: shared configuration and the HTTP server.

pub mod config;
pub mod server;
