//! services/api/src/lib.rs
//!
//! The PAID questionnaire HTTP service: adapters for the core ports, startup
//! configuration, and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
