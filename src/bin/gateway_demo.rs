//! Demo entrypoint: loads config and credentials, builds a small in-memory
//! catalog, and runs one selection + retry cycle end to end.

use gateway_core::circuit_breaker::CircuitBreaker;
use gateway_core::config::GatewayConfig;
use gateway_core::credentials;
use gateway_core::errors::GatewayError;
use gateway_core::model::{Catalog, CatalogModel, Message, Pricing, ProviderModels};
use gateway_core::rate_limit::RateLimitTracker;
use gateway_core::retry::{dispatch_with_circuit_breaker, NoopHooks, RetryConfig, TrackedTarget};
use gateway_core::selector::{select_with_fallback, SelectRequest};
use tokio_util::sync::CancellationToken;

fn demo_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.insert(
        "groq".to_string(),
        ProviderModels {
            models: vec![
                CatalogModel {
                    name: "llama-3-8b-8192".to_string(),
                    context_window: 8_192,
                    pricing: Pricing { input: 0.0, output: 0.0 },
                    free: true,
                    category: None,
                },
                CatalogModel {
                    name: "llama-3.3-70b-versatile".to_string(),
                    context_window: 32_000,
                    pricing: Pricing { input: 0.59, output: 0.79 },
                    free: false,
                    category: None,
                },
            ],
        },
    );
    catalog
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = GatewayConfig::load("gateway.toml").await?;
    let env_credentials = credentials::load_from_env();
    tracing::info!(count = env_credentials.len(), "loaded credentials from environment");

    let catalog = demo_catalog();
    let tracker = RateLimitTracker::new();
    let breaker = CircuitBreaker::new(config.circuit_breaker);
    let messages = vec![Message::user("Summarize the quarterly report in three bullet points.")];

    let request = SelectRequest {
        messages: &messages,
        tools: None,
        max_tokens: 512,
        catalog: &catalog,
        preferences: None,
        tracker: Some(&tracker),
        round_robin: None,
    };

    let selection = select_with_fallback(&request)?;
    tracing::info!(
        model = %selection.model,
        provider_type = %selection.provider_type,
        category = %selection.category,
        "selected model"
    );

    let retry_config = RetryConfig {
        max_retries: config.retry.max_retries,
        backoff: config.retry.backoff,
    };
    let cancel = CancellationToken::new();
    let attempts = std::sync::atomic::AtomicU32::new(0);
    let target = TrackedTarget {
        tracker: &tracker,
        provider_type: &selection.provider_type,
        model: &selection.model,
    };

    let result: Result<&str, GatewayError> = dispatch_with_circuit_breaker(
        &selection.provider_type,
        |_attempt| {
            attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Ok("response body placeholder") }
        },
        &retry_config,
        &NoopHooks,
        &cancel,
        Some(&target),
        &breaker,
    )
    .await;

    match result {
        Ok(body) => println!("{body}"),
        Err(err) => eprintln!("request failed: {err}"),
    }

    Ok(())
}
