//! # dsk
//!
//! An async Rust client for the DeepSeek web chat API.
//!
//! ## Features
//!
//! - **Proof of Work**: Solves `DeepSeekHashV1` challenges before every
//!   completion, off the async executor.
//! - **Cloudflare Recovery**: Detects the "Just a moment..." interstitial,
//!   refreshes clearance cookies through a pluggable [`CookieRefresher`], and
//!   retries.
//! - **Streaming**: Completions arrive as a [`futures::Stream`] of
//!   [`StreamEvent`]s, one per server-sent event.
//! - **Browser headers**: Sends the same header set as the web app.
//!
//! ## Quick Start
//!
//! ```ignore
//! use dsk::{CompletionOptions, DeepSeek};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let api = DeepSeek::builder("your_auth_token")
//!         .cookie_path("cookies.json")
//!         .refresh_command("./bypass")
//!         .build()?;
//!
//!     let session = api.create_chat_session().await?;
//!     let mut stream = api
//!         .chat_completion(&session, "What is Rust?", CompletionOptions::default())
//!         .await?;
//!
//!     while let Some(event) = stream.next().await {
//!         print!("{}", event?.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Every failure is a distinct [`DskError`] variant, so callers can back off
//! on [`DskError::RateLimit`], re-authenticate on
//! [`DskError::Authentication`], or give up on [`DskError::GatewayBypass`].

pub mod client;
pub mod cookies;
pub mod crypto;
pub mod error;
pub mod models;
pub mod sse;

// Re-exports for convenience
pub use client::{Credentials, DeepSeek, DeepSeekBuilder};
pub use cookies::{CommandRefresher, CookieJar, CookieRefresher, CookieStore, NoopRefresher};
pub use error::{DskError, Result};
pub use models::{Challenge, ChallengeAnswer, CompletionOptions, StreamEvent};
pub use sse::{decode_line, EventStream};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_event_default() {
        let event = StreamEvent::default();
        assert!(event.content.is_empty());
        assert!(!event.stop);
    }
}
