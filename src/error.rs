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

//! Error types for the exporter.
//!
//! Errors fall into three groups:
//!
//! - [`enum@Error`] covers startup and scrape-level failures. Startup errors
//!   (runtime initialization, enumeration, configuration) are fatal.
//! - [`DeviceError`] is the cause of a single failed device query. It never
//!   escapes a collection cycle; the collector records it and drives the
//!   `up` gauge to 0.
//! - [`RegistryError`] signals a misuse of the metric registry, such as a
//!   duplicate catalog entry or a label set of the wrong arity.

use nvml_wrapper::error::NvmlError;
use thiserror::Error;

/// The main error type for exporter operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The hardware management runtime could not be initialized.
    #[error("Platform initialization failed: {0}")]
    PlatformInit(String),

    /// Enumeration succeeded but reported no devices.
    #[error("No supported devices found")]
    NoDevicesFound,

    /// The metric registry rejected an operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Invalid runtime configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A previous collection cycle panicked while holding the registry lock.
    #[error("Metric registry lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of one telemetry query against one device.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("NVML error: {0}")]
    Nvml(#[from] NvmlError),

    /// Query failure reported by a non-NVML reader.
    #[error("Device query failed: {0}")]
    Query(String),
}

/// Misuse of the metric registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Metric {0} is registered more than once")]
    DuplicateMetric(String),

    #[error("Invalid metric or label name: {0:?}")]
    InvalidMetricName(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Metric {metric} expects {expected} label values, got {got}")]
    LabelArity {
        metric: String,
        expected: usize,
        got: usize,
    },
}

/// A specialized Result type for exporter operations.
pub type Result<T> = std::result::Result<T, Error>;
