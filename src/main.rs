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
use nvml_exporter::api::{init_tracing, run_api_mode};
use nvml_exporter::cli::Cli;
use nvml_exporter::{Exporter, NvidiaDeviceReader};

#[tokio::main]
async fn main() {
    let config = Cli::parse().into_config();
    init_tracing();

    if let Err(e) = config.validate() {
        tracing::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    // NVML failures here are fatal: never start serving without devices
    let reader = match NvidiaDeviceReader::new() {
        Ok(reader) => reader,
        Err(e) => {
            tracing::error!("Failed initializing exporter: {e}");
            eprintln!("Error: Failed initializing exporter: {e}");
            std::process::exit(1);
        }
    };

    let exporter = match Exporter::new(Box::new(reader), config.failure_policy) {
        Ok(exporter) => exporter,
        Err(e) => {
            tracing::error!("Failed initializing exporter: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Exporting {} GPU(s), failure policy {:?}",
        exporter.devices().len(),
        exporter.policy()
    );

    if let Err(e) = run_api_mode(&config, exporter).await {
        tracing::error!("Server error: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
