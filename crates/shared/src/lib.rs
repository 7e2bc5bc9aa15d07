//! Shared utilities for the event check-in backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Organizer token signing and validation
//! - Common validation logic

pub mod jwt;
pub mod validation;
