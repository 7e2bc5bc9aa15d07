//! Domain layer for the event check-in backend.
//!
//! This crate contains:
//! - Domain models (Event, Registration, check-in request/response)
//! - The scan payload codec
//! - The check-in verification service and its store traits

pub mod models;
pub mod services;
