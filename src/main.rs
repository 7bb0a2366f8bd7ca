//! passgate application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Connect to Redis
//! 3. Build the auth service and router
//! 4. Start Axum server
//!
//! Also supports a `gen-secret` subcommand for generating a `JWT_SECRET`.

use passgate::{
    auth::AppState,
    config::Config,
    routes,
    storage::{CredentialStore, RedisStore},
};
use rand::Rng;
use std::sync::Arc;

/// Generate a random signing secret, base64-encoded (48 bytes -> 64 chars).
fn gen_secret() -> String {
    let mut rng = rand::rng();
    let mut bytes = [0u8; 48];
    rng.fill(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

fn print_usage() {
    eprintln!("Usage: passgate [gen-secret]");
    eprintln!();
    eprintln!("With no arguments, starts the server using configuration from the environment.");
    eprintln!();
    eprintln!("  gen-secret    Print a random value suitable for JWT_SECRET");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None => {}
        Some("gen-secret") if args.len() == 2 => {
            println!("{}", gen_secret());
            return;
        }
        Some(_) => {
            print_usage();
            std::process::exit(1);
        }
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = Config::from_env().expect("Failed to load config");
    tracing::info!(config = ?config, "Starting passgate on {}", config.bind_addr);

    let store = RedisStore::open(&config.redis_url).expect("Invalid Redis URL");

    // Verify Redis connection
    store.ping().await.expect("Failed to connect to Redis");

    let state = AppState::new(Arc::new(store), &config).expect("Failed to build auth service");
    let app = routes::app(state, &config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};

    #[test]
    fn test_gen_secret() {
        let secret = gen_secret();
        assert_eq!(secret.len(), 64);
        assert!(secret.len() >= passgate::config::MIN_SECRET_BYTES);
        assert_eq!(general_purpose::STANDARD.decode(&secret).unwrap().len(), 48);
        assert_ne!(secret, gen_secret());
    }
}
