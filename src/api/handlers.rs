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

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use std::sync::Arc;

use crate::collector::Exporter;

/// Content type of the Prometheus text exposition format.
pub const TEXT_FORMAT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone)]
pub struct SharedState {
    pub exporter: Arc<Exporter>,
    pub landing_page: Arc<str>,
}

/// Run one collection cycle and return the rendered registry.
///
/// Device queries block, so the cycle runs on the blocking pool. A client
/// that disconnects early does not cancel the cycle.
pub async fn metrics_handler(State(state): State<SharedState>) -> Response {
    let exporter = state.exporter.clone();
    match tokio::task::spawn_blocking(move || exporter.collect_and_render()).await {
        Ok(Ok(body)) => ([(header::CONTENT_TYPE, TEXT_FORMAT_CONTENT_TYPE)], body).into_response(),
        Ok(Err(e)) => {
            tracing::error!("Metrics collection failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("Metrics collection task failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn landing_handler(State(state): State<SharedState>) -> Html<String> {
    Html(state.landing_page.to_string())
}
