/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (key set, verifier) → Router 組み立て
 * - Middleware の適用 (request id / trace / timeout / security headers)
 * - axum::serve() で起動, Ctrl-C / SIGTERM で graceful shutdown
 */
use std::{panic, process, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::auth::{AuthenticationDelegate, ValidationService, factory};
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,token_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panic via tracing so they don't get "lost"
        tracing::error!(?info, "panic");

        // In development, fail fast. In production, keep serving other requests.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting token gateway in {:?} mode on {} (verifier: {:?})",
        config.app_env,
        config.addr,
        config.verifier
    );

    let state = build_state(&config)?;
    let app = build_router(state, config.http_request_timeout);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("token gateway stopped");
    Ok(())
}

pub fn build_state(config: &Config) -> Result<AppState> {
    // Process-wide, read-only after this point.
    let identity = factory::build_local_verifier(config)?;
    let verifier = factory::build_verifier(config, identity.clone())?;

    if identity.is_none() {
        tracing::warn!(
            "no signing keys configured: POST /authenticate has no identity middleware and will fail"
        );
    }

    let validation = Arc::new(ValidationService::new(verifier));
    tracing::info!(strategy = validation.strategy(), "token validation ready");
    let delegate = Arc::new(AuthenticationDelegate::new(
        config.authenticate_result_template.clone(),
    ));

    Ok(AppState::new(validation, identity, delegate))
}

pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let router = Router::new()
        .merge(api::routes(state.clone()))
        .with_state(state);

    // security headers go outermost so timeout/limit responses carry them too
    let router = middleware::http::apply(router, request_timeout);
    middleware::security_headers::apply(router)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
