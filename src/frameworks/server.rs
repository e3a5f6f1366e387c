// Framework bootstrap for the relay runtime.

use crate::frameworks::config::Config;
use crate::interface_adapters::broadcast::Broadcaster;
use crate::interface_adapters::http::{require_basic_auth, serve_web_asset};
use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{ClientRegistry, OptionsStore};

use axum::{Router, middleware, routing::get};
use std::io::Result;
use std::net::SocketAddr;
use std::sync::Arc;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener, config: Config) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(config);

    // Everything, the WebSocket upgrade included, sits behind the auth gate.
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .fallback(serve_web_asset)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));

    // Bind TCP listener with error handling.
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, config).await
}

fn build_state(config: Config) -> Arc<AppState> {
    // The single shared document, seeded with full defaults.
    let options = Arc::new(OptionsStore::new());
    // Owns connection ids and the live roster for the whole process.
    let registry = Arc::new(ClientRegistry::new());
    let broadcaster = Arc::new(Broadcaster::new(registry.clone(), options.clone()));

    Arc::new(AppState {
        config: Arc::new(config),
        options,
        registry,
        broadcaster,
    })
}
