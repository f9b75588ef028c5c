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

//! Integration tests for the nvml-exporter library API.

use nvml_exporter::metrics::catalog::{GAUGE_CATALOG, NAMESPACE};
use nvml_exporter::metrics::{MetricDef, MetricRegistry};
use nvml_exporter::{DeviceReader, Error, Exporter, FailurePolicy, NvidiaDeviceReader};

#[test]
fn test_nvidia_reader_does_not_panic() {
    // Without an NVIDIA driver this fails cleanly instead of panicking
    match NvidiaDeviceReader::new() {
        Ok(reader) => {
            println!("Found {} GPU(s)", reader.devices().len());
            assert!(!reader.devices().is_empty());
            let exporter = Exporter::new(Box::new(reader), FailurePolicy::FailFast).unwrap();
            let text = exporter.collect_and_render().unwrap();
            assert!(text.contains("nvml_up "));
        }
        Err(Error::PlatformInit(msg)) => println!("NVML unavailable: {msg}"),
        Err(Error::NoDevicesFound) => println!("NVML loaded but no GPUs present"),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_catalog_contract() {
    let names: Vec<&str> = GAUGE_CATALOG.iter().map(|def| def.name).collect();
    assert_eq!(
        names,
        vec![
            "power_watts",
            "gpu_percent",
            "memory_free",
            "memory_total",
            "memory_used",
            "memory_percent",
            "temperature_fahrenheit",
            "temperature_celsius",
        ]
    );
    for def in GAUGE_CATALOG {
        assert_eq!(def.labels, &["device_id", "device_uuid", "device_name"]);
    }
}

#[test]
fn test_registry_describe_matches_catalog() {
    let registry = MetricRegistry::register(NAMESPACE, GAUGE_CATALOG).unwrap();
    let described: Vec<String> = registry.describe().iter().map(|d| d.name.clone()).collect();
    assert_eq!(described.len(), GAUGE_CATALOG.len() + 1);
    assert!(described.contains(&"nvml_memory_percent".to_string()));
    assert_eq!(described.last().unwrap(), "nvml_up");
}

#[test]
fn test_custom_catalog() {
    const CATALOG: &[MetricDef] = &[MetricDef::device("fan_percent", "Fan speed")];
    let mut registry = MetricRegistry::register("test", CATALOG).unwrap();
    registry
        .set_value("fan_percent", &["0", "GPU-0", "T4"], 30.0)
        .unwrap();
    let text = registry.render();
    assert!(text.contains("# HELP test_fan_percent Fan speed\n"));
    assert!(text.contains("test_fan_percent{device_id=\"0\",device_uuid=\"GPU-0\",device_name=\"T4\"} 30\n"));
    assert!(text.ends_with("test_up 1\n"));
}
