//! HTTP route handlers.

pub mod check_in;
pub mod events;
pub mod health;
pub mod registrations;
