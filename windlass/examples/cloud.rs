//! DeepSeek generation through the execution middleware.
//!
//! Requires the DEEPSEEK_API_KEY environment variable. The context carries
//! an opaque key id so the audit trail can attribute usage without ever
//! seeing the secret.

use std::sync::Arc;
use windlass::middleware::OperationExecutor;
use windlass::{OperationContext, Provider, ProviderKind};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let api_key =
        std::env::var("DEEPSEEK_API_KEY").expect("DEEPSEEK_API_KEY environment variable not set");

    let provider = Arc::new(windlass::provider::deepseek(api_key)?);
    let executor = OperationExecutor::builder().finish();

    let context = OperationContext::new()
        .with_api_key_id("deepseek-primary")
        .with_max_tokens(200);

    println!("=== Example 1: generate ===\n");

    let generation = provider.clone();
    let ctx = context.clone();
    let result = executor
        .execute(
            move || {
                let provider = generation.clone();
                let ctx = ctx.clone();
                async move {
                    provider
                        .generate(
                            "Explain exponential backoff in two sentences.",
                            Some(&ctx),
                            Some(0.3),
                        )
                        .await
                }
            },
            "generate",
            ProviderKind::DeepSeek,
            Some(&context),
        )
        .await;

    match result.into_result() {
        Ok(text) => println!("{text}"),
        Err(error) => eprintln!("Error: {error:?}"),
    }

    println!("\n=== Example 2: list models ===\n");

    let listing = provider.clone();
    let result = executor
        .execute(
            move || {
                let provider = listing.clone();
                async move { provider.list_models().await }
            },
            "list_models",
            ProviderKind::DeepSeek,
            Some(&context),
        )
        .await;

    match result.into_result() {
        Ok(models) => {
            for model in models {
                println!("  - {model}");
            }
        }
        Err(error) => eprintln!("Error: {error:?}"),
    }

    let stats = executor.statistics();
    println!("\nretries so far: {}", stats.total_retries);

    Ok(())
}
