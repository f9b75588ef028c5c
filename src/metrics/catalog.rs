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

//! Static metric catalog.

/// Prefix applied to every exported metric name.
pub const NAMESPACE: &str = "nvml";

/// Label schema shared by every device-scoped gauge.
pub const DEVICE_LABELS: &[&str] = &["device_id", "device_uuid", "device_name"];

pub const POWER_WATTS: &str = "power_watts";
pub const GPU_PERCENT: &str = "gpu_percent";
pub const MEMORY_FREE: &str = "memory_free";
pub const MEMORY_TOTAL: &str = "memory_total";
pub const MEMORY_USED: &str = "memory_used";
pub const MEMORY_PERCENT: &str = "memory_percent";
pub const TEMPERATURE_FAHRENHEIT: &str = "temperature_fahrenheit";
pub const TEMPERATURE_CELSIUS: &str = "temperature_celsius";

/// Definition of one gauge: name without namespace, help text, label schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDef {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

impl MetricDef {
    pub const fn device(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            labels: DEVICE_LABELS,
        }
    }
}

/// Device gauges, in render order.
pub const GAUGE_CATALOG: &[MetricDef] = &[
    MetricDef::device(POWER_WATTS, "Power Usage of an NVIDIA GPU in Watts"),
    MetricDef::device(GPU_PERCENT, "Percent of GPU Utilized"),
    MetricDef::device(MEMORY_FREE, "Number of bytes free in the GPU Memory"),
    MetricDef::device(MEMORY_TOTAL, "Total bytes of the GPU's memory"),
    MetricDef::device(MEMORY_USED, "Total number of bytes used in the GPU Memory"),
    MetricDef::device(MEMORY_PERCENT, "Percent of GPU Memory Utilized"),
    MetricDef::device(TEMPERATURE_FAHRENHEIT, "GPU Temperature in Fahrenheit"),
    MetricDef::device(TEMPERATURE_CELSIUS, "GPU Temperature in Celsius"),
];

/// The unlabeled exporter health gauge.
pub const UP: MetricDef = MetricDef {
    name: "up",
    help: "Were the NVML queries successful?",
    labels: &[],
};
