// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::handlers::{landing_handler, metrics_handler, SharedState};
use crate::collector::Exporter;
use crate::config::{ExporterConfig, DEFAULT_LOG_FILTER};
use crate::error::Result;

/// Install the global tracing subscriber, honoring `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the router: metrics on the configured path, landing page elsewhere.
///
/// `config` must have passed [`ExporterConfig::validate`]; route pattern
/// syntax in the metrics path is rejected there.
pub fn router(exporter: Arc<Exporter>, config: &ExporterConfig) -> Router {
    let state = SharedState {
        exporter,
        landing_page: config.landing_page().into(),
    };

    Router::new()
        .route(&config.metrics_path, get(metrics_handler))
        .route("/", get(landing_handler))
        .fallback(landing_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve `app` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Bind the configured address and serve scrapes until Ctrl+C or SIGTERM.
pub async fn run_api_mode(config: &ExporterConfig, exporter: Exporter) -> Result<()> {
    config.validate()?;
    let app = router(Arc::new(exporter), config);

    let addr = config.listen_address.as_str();
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener on {addr}: {e}");
        e
    })?;
    tracing::info!(
        "Starting NVML Exporter Server on {}, metrics at {}",
        listener.local_addr()?,
        config.metrics_path
    );

    serve(listener, app, shutdown_signal()).await
}

/// Resolve on Ctrl+C, or on SIGTERM on Unix systems.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received, stopping server");
}
