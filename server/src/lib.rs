//! Encrypted, versioned pastebin server library.
//! This crate exposes internal modules for integration testing.
//! The binary entry point is in main.rs.

pub mod config;
pub mod db;
pub mod error;
pub mod paste;
pub mod routes;
pub mod state;
