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

use clap::Parser;

use crate::collector::FailurePolicy;
use crate::config::{ExporterConfig, DEFAULT_LISTEN_ADDRESS, DEFAULT_METRICS_PATH};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long = "web.listen-address", default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen_address: String,
    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", default_value = DEFAULT_METRICS_PATH)]
    pub telemetry_path: String,
    /// Keep collecting other devices when one device's query fails,
    /// instead of aborting the whole scrape at the first failure.
    #[arg(long = "collector.isolate-device-failures")]
    pub isolate_device_failures: bool,
}

impl Cli {
    pub fn into_config(self) -> ExporterConfig {
        ExporterConfig {
            listen_address: self.listen_address,
            metrics_path: self.telemetry_path,
            failure_policy: if self.isolate_device_failures {
                FailurePolicy::IsolateDevice
            } else {
                FailurePolicy::FailFast
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Cli::parse_from(["nvml-exporter"]).into_config();
        assert_eq!(config.listen_address, "0.0.0.0:9114");
        assert_eq!(config.metrics_path, "/metrics");
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_overrides() {
        let config = Cli::parse_from([
            "nvml-exporter",
            "--web.listen-address",
            "127.0.0.1:9200",
            "--web.telemetry-path=/gpu",
            "--collector.isolate-device-failures",
        ])
        .into_config();
        assert_eq!(config.listen_address, "127.0.0.1:9200");
        assert_eq!(config.metrics_path, "/gpu");
        assert_eq!(config.failure_policy, FailurePolicy::IsolateDevice);
    }
}
