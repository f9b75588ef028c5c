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

//! Pull-based Prometheus exporter for NVIDIA GPU telemetry.
//!
//! Each scrape runs one collection cycle against every enumerated device
//! and renders the result in the Prometheus text format.
//!
//! ```rust,no_run
//! use nvml_exporter::{Exporter, FailurePolicy, NvidiaDeviceReader};
//!
//! fn main() -> nvml_exporter::Result<()> {
//!     let reader = NvidiaDeviceReader::new()?;
//!     let exporter = Exporter::new(Box::new(reader), FailurePolicy::FailFast)?;
//!     print!("{}", exporter.collect_and_render()?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod collector;
pub mod config;
pub mod device;
pub mod error;
pub mod metrics;

pub use collector::{CycleOutcome, Exporter, FailurePolicy, QueryFailure, SnapshotCollector};
pub use config::ExporterConfig;
pub use device::{DeviceIdentity, DeviceReader, NvidiaDeviceReader};
pub use error::{DeviceError, Error, RegistryError, Result};
