//! Resilient generation against a local Ollama daemon.
//!
//! Walks through the full pipeline: a generation with retries enabled, a
//! burst that trips the rate limiter, then the statistics snapshot.
//!
//! Run with a local Ollama instance (override with OLLAMA_BASE_URL):
//!   cargo run --example resilience

use std::sync::Arc;
use std::time::Duration;
use windlass::middleware::OperationExecutor;
use windlass::provider::OllamaProvider;
use windlass::{OperationConfiguration, OperationContext, Provider, ProviderKind};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let base_url =
        std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| "http://localhost:11434".to_string());
    let provider = Arc::new(OllamaProvider::builder().base_url(base_url).build()?);

    println!("provider available: {}\n", provider.is_available().await);

    let executor = OperationExecutor::builder()
        .configuration(
            OperationConfiguration::default()
                .with_max_retries(2)
                .with_base_retry_delay(Duration::from_millis(500))
                .with_max_requests_per_window(5)
                .with_rate_limit_window(Duration::from_secs(10)),
        )
        .finish();

    // One generation through the full pipeline.
    let prompt = "Why is the sky blue? Answer in one sentence.";
    let context = OperationContext::new()
        .with_max_tokens(128)
        .with_prompt(prompt);

    let generation = provider.clone();
    let ctx = context.clone();
    let result = executor
        .execute(
            move || {
                let provider = generation.clone();
                let ctx = ctx.clone();
                async move { provider.generate(prompt, Some(&ctx), Some(0.7)).await }
            },
            "generate",
            ProviderKind::Ollama,
            Some(&context),
        )
        .await;

    println!("generate took {:?}", result.duration);
    match result.into_result() {
        Ok(text) => println!("{text}\n"),
        Err(error) => eprintln!("generation failed: {error}\n"),
    }

    // Burst past the window budget to show the limiter rejecting calls.
    for attempt in 1..=7 {
        let listing = provider.clone();
        let result = executor
            .execute(
                move || {
                    let provider = listing.clone();
                    async move { provider.list_models().await }
                },
                "list_models",
                ProviderKind::Ollama,
                None,
            )
            .await;
        match &result.error {
            None => println!("attempt {attempt}: ok"),
            Some(error) => println!("attempt {attempt}: {:?}", error.kind),
        }
    }

    let stats = executor.statistics();
    println!("\nstatistics:\n{}", serde_json::to_string_pretty(&stats)?);
    executor.clear_statistics();

    provider.close().await?;
    Ok(())
}
