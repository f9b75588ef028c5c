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

use crate::collector::FailurePolicy;
use crate::error::{Error, Result};

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9114";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_LOG_FILTER: &str = "nvml_exporter=info,tower_http=info";

/// Runtime configuration of the exporter process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub listen_address: String,
    pub metrics_path: String,
    pub failure_policy: FailurePolicy,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl ExporterConfig {
    /// Check the configuration before anything is bound or routed.
    ///
    /// The listen address only has to have the `host:port` shape; host names
    /// are resolved when the listener is bound.
    pub fn validate(&self) -> Result<()> {
        self.validate_listen_address()?;
        self.validate_metrics_path()
    }

    fn validate_listen_address(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Error::Config(format!(
                "listen address {:?} is not host:port: {reason}",
                self.listen_address
            ))
        };

        let (host, port) = self
            .listen_address
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port"))?;
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        // IPv6 literals need brackets, e.g. [::1]:9114
        if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
            return Err(invalid("IPv6 host must be bracketed"));
        }
        port.parse::<u16>()
            .map_err(|e| invalid(&format!("bad port {port:?}: {e}")))?;
        Ok(())
    }

    fn validate_metrics_path(&self) -> Result<()> {
        let path = &self.metrics_path;
        if !path.starts_with('/') {
            return Err(Error::Config(format!(
                "telemetry path {path:?} must start with '/'"
            )));
        }
        // "/" serves the landing page
        if path == "/" {
            return Err(Error::Config(
                "telemetry path must not be the root path".to_string(),
            ));
        }
        // the router reads these as captures and wildcards
        let pattern_syntax = path.contains(['{', '}', '*'])
            || path.split('/').any(|segment| segment.starts_with(':'));
        if pattern_syntax {
            return Err(Error::Config(format!(
                "telemetry path {path:?} must be a literal path without '{{', '}}', '*' or ':' segments"
            )));
        }
        Ok(())
    }

    /// HTML served on the root path, linking to the metrics path.
    pub fn landing_page(&self) -> String {
        format!(
            "<html>\n\
             <head><title>NVML Exporter</title></head>\n\
             <body>\n\
             <h1>NVML Exporter</h1>\n\
             <p><a href='{}'>Metrics</a></p>\n\
             </body>\n\
             </html>\n",
            self.metrics_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExporterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_accepts_host_names_and_ipv6() {
        for address in ["localhost:9114", "gpu-node-7.example.com:9114", "[::1]:9114"] {
            let config = ExporterConfig {
                listen_address: address.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "{address}");
        }
    }

    #[test]
    fn test_rejects_bad_listen_address() {
        let config = ExporterConfig {
            listen_address: ":9114".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        for address in ["localhost", "localhost:http", "localhost:70000", "::1:9114"] {
            let config = ExporterConfig {
                listen_address: address.to_string(),
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(Error::Config(_))), "{address}");
        }
    }

    #[test]
    fn test_rejects_bad_metrics_path() {
        let relative = ExporterConfig {
            metrics_path: "metrics".to_string(),
            ..Default::default()
        };
        assert!(relative.validate().is_err());

        let root = ExporterConfig {
            metrics_path: "/".to_string(),
            ..Default::default()
        };
        assert!(root.validate().is_err());
    }

    #[test]
    fn test_rejects_route_pattern_syntax() {
        for path in ["/*metrics", "/{metrics", "/metrics}", "/{id}", "/gpu/:id"] {
            let config = ExporterConfig {
                metrics_path: path.to_string(),
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(Error::Config(_))), "{path}");
        }
    }

    #[test]
    fn test_landing_page_links_metrics_path() {
        let config = ExporterConfig {
            metrics_path: "/gpu-metrics".to_string(),
            ..Default::default()
        };
        let page = config.landing_page();
        assert!(page.contains("<title>NVML Exporter</title>"));
        assert!(page.contains("<a href='/gpu-metrics'>Metrics</a>"));
    }
}
