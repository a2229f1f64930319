//! Typed client for the family expense tracker backend.
//!
//! The [`domain`] module holds the read models and action dispatchers; the
//! [`outbound`] module adapts them to Supabase.

pub mod config;
pub mod domain;
pub mod format;
pub mod outbound;
