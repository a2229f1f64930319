//! Outbound adapters implementing domain ports.
//!
//! - **supabase**: reqwest-backed procedure gateway and auth provider
//! - **notifier**: notifications emitted as tracing events
//!
//! Adapters translate between domain types and wire representations. They
//! contain no business logic.

pub mod notifier;
pub mod supabase;
