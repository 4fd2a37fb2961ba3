//! slidecat library
//!
//! This library exposes the catalog core (records, tags, search, import and
//! color enrichment) for the command-line binary and for testing.

pub mod app;
pub mod color;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
