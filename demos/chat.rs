//! Example: streaming a single answer to the console.
//!
//! Run with: DSK_AUTH_TOKEN=... cargo run --example chat -- "What is Rust?"
//!
//! Optional:
//! - `DSK_COOKIES` path to the cookie file (`{"cookies": {...}}`)
//! - `DSK_REFRESH` program that rewrites the cookie file when Cloudflare blocks us

use dsk::{CompletionOptions, DeepSeek};
use futures::StreamExt;
use std::io::Write;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for debug output (optional)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let token = std::env::var("DSK_AUTH_TOKEN").unwrap_or_default();
    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "What is Python?".to_string());

    let mut builder = DeepSeek::builder(token);
    if let Ok(path) = std::env::var("DSK_COOKIES") {
        builder = builder.cookie_path(path);
    }
    if let Ok(program) = std::env::var("DSK_REFRESH") {
        builder = builder.refresh_command(program);
    }
    let api = builder.build()?;

    let chat_id = api.create_chat_session().await?;
    println!("chat_id: {}", chat_id);

    let options = CompletionOptions {
        thinking_enabled: false,
        ..Default::default()
    };
    let mut stream = api.chat_completion(&chat_id, &prompt, options).await?;

    let mut stdout = std::io::stdout();
    while let Some(event) = stream.next().await {
        let event = event?;
        print!("{}", event.content);
        stdout.flush()?;
    }
    println!();

    Ok(())
}
