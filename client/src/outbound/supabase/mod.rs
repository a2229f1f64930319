//! Supabase outbound adapter.
//!
//! One explicitly constructed client implements both the procedure gateway
//! (PostgREST `rpc/` endpoints) and the auth provider (GoTrue endpoints).

mod auth;
mod client;
mod dto;
mod rpc;

use reqwest::StatusCode;

pub use client::{SessionTokens, SupabaseClient, SupabaseConfig};

fn status_message(status: StatusCode, detail: &str) -> String {
    if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), detail)
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
