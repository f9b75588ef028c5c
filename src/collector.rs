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

//! Snapshot collection.
//!
//! One scrape runs one cycle: reset every series, mark the exporter healthy,
//! then query each device in enumeration order. A device's series are
//! written only once all four of its query classes succeeded, so a device is
//! either fully present in a snapshot or absent from it. The whole cycle and
//! the following render happen under a single lock, so a concurrent scrape
//! waits and then runs its own fresh cycle.
//!
//! Device queries carry no timeout. A query that hangs inside the management
//! library holds the lock and blocks every later scrape.

use std::fmt;
use std::sync::Mutex;

use crate::device::{
    DeviceIdentity, DeviceReader, MemoryInfo, QueryClass, Temperature, Utilization,
};
use crate::error::{DeviceError, Error, RegistryError, Result};
use crate::metrics::catalog::{
    GAUGE_CATALOG, GPU_PERCENT, MEMORY_FREE, MEMORY_PERCENT, MEMORY_TOTAL, MEMORY_USED, NAMESPACE,
    POWER_WATTS, TEMPERATURE_CELSIUS, TEMPERATURE_FAHRENHEIT,
};
use crate::metrics::MetricRegistry;

/// What to do when a device query fails mid-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole cycle at the first failing query. Devices after the
    /// failing one get no series this cycle.
    #[default]
    FailFast,
    /// Drop the failing device from this cycle and continue with the next one.
    IsolateDevice,
}

/// A single failed query and the device it was issued against.
#[derive(Debug)]
pub struct QueryFailure {
    pub device_index: u32,
    pub device_uuid: String,
    pub query: QueryClass,
    pub cause: DeviceError,
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to get {} for GPU {} ({}): {}",
            self.query, self.device_index, self.device_uuid, self.cause
        )
    }
}

/// Result of one collection cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Every query on every device succeeded.
    Complete,
    /// Fail-fast abort at the first failing query.
    Aborted(QueryFailure),
    /// Device isolation: the listed devices have no series this cycle.
    Degraded(Vec<QueryFailure>),
}

impl CycleOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, CycleOutcome::Complete)
    }

    pub fn failures(&self) -> &[QueryFailure] {
        match self {
            CycleOutcome::Complete => &[],
            CycleOutcome::Aborted(failure) => std::slice::from_ref(failure),
            CycleOutcome::Degraded(failures) => failures,
        }
    }
}

/// Raw readings of one device, committed to the registry only when every
/// query class succeeded.
#[derive(Debug, Clone, Copy)]
struct DeviceSample {
    utilization: Utilization,
    temperature: Temperature,
    watts: u32,
    memory: MemoryInfo,
}

/// Runs collection cycles against a device reader into a registry.
pub struct SnapshotCollector<'a> {
    reader: &'a dyn DeviceReader,
    policy: FailurePolicy,
}

impl<'a> SnapshotCollector<'a> {
    pub fn new(reader: &'a dyn DeviceReader, policy: FailurePolicy) -> Self {
        Self { reader, policy }
    }

    /// Run one refresh cycle.
    ///
    /// The caller must hold exclusive access to `registry` for the duration
    /// of the call and of any read that should observe this cycle.
    pub fn run_cycle(
        &self,
        registry: &mut MetricRegistry,
    ) -> std::result::Result<CycleOutcome, RegistryError> {
        registry.reset();
        registry.set_health(true);

        let mut failures = Vec::new();
        for device in self.reader.devices() {
            match self.read_device(device) {
                Ok(sample) => write_device(registry, device, &sample)?,
                Err(failure) => {
                    registry.set_health(false);
                    tracing::warn!(
                        device_index = failure.device_index,
                        device_uuid = %failure.device_uuid,
                        query = %failure.query,
                        "{failure}"
                    );
                    match self.policy {
                        FailurePolicy::FailFast => return Ok(CycleOutcome::Aborted(failure)),
                        FailurePolicy::IsolateDevice => failures.push(failure),
                    }
                }
            }
        }

        if failures.is_empty() {
            Ok(CycleOutcome::Complete)
        } else {
            Ok(CycleOutcome::Degraded(failures))
        }
    }

    /// Issue the four query classes in order, stopping at the first failure.
    fn read_device(
        &self,
        device: &DeviceIdentity,
    ) -> std::result::Result<DeviceSample, QueryFailure> {
        let failed = |query: QueryClass| {
            move |cause: DeviceError| QueryFailure {
                device_index: device.index,
                device_uuid: device.uuid.clone(),
                query,
                cause,
            }
        };

        let utilization = self
            .reader
            .get_utilization(device)
            .map_err(failed(QueryClass::Utilization))?;
        let temperature = self
            .reader
            .get_temperature(device)
            .map_err(failed(QueryClass::Temperature))?;
        let watts = self
            .reader
            .get_power_usage(device)
            .map_err(failed(QueryClass::PowerUsage))?;
        let memory = self
            .reader
            .get_memory_info(device)
            .map_err(failed(QueryClass::MemoryInfo))?;

        Ok(DeviceSample {
            utilization,
            temperature,
            watts,
            memory,
        })
    }
}

fn write_device(
    registry: &mut MetricRegistry,
    device: &DeviceIdentity,
    sample: &DeviceSample,
) -> std::result::Result<(), RegistryError> {
    let labels = device.label_values();
    let utilization = sample.utilization;
    registry.set_value(GPU_PERCENT, &labels, f64::from(utilization.gpu_percent))?;
    registry.set_value(MEMORY_PERCENT, &labels, f64::from(utilization.memory_percent))?;

    let temperature = sample.temperature;
    registry.set_value(TEMPERATURE_CELSIUS, &labels, f64::from(temperature.celsius))?;
    registry.set_value(
        TEMPERATURE_FAHRENHEIT,
        &labels,
        f64::from(temperature.fahrenheit),
    )?;

    registry.set_value(POWER_WATTS, &labels, f64::from(sample.watts))?;

    // exact for any realistic device memory size (< 2^53 bytes)
    registry.set_value(MEMORY_FREE, &labels, sample.memory.free as f64)?;
    registry.set_value(MEMORY_TOTAL, &labels, sample.memory.total as f64)?;
    registry.set_value(MEMORY_USED, &labels, sample.memory.used as f64)?;
    Ok(())
}

/// A device reader paired with the registry it populates.
///
/// Built once at startup and shared by reference with the scrape server.
pub struct Exporter {
    reader: Box<dyn DeviceReader>,
    policy: FailurePolicy,
    registry: Mutex<MetricRegistry>,
}

impl Exporter {
    pub fn new(reader: Box<dyn DeviceReader>, policy: FailurePolicy) -> Result<Self> {
        let registry = MetricRegistry::register(NAMESPACE, GAUGE_CATALOG)?;
        Ok(Self {
            reader,
            policy,
            registry: Mutex::new(registry),
        })
    }

    pub fn devices(&self) -> &[DeviceIdentity] {
        self.reader.devices()
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run one cycle, then hand the registry and outcome to `read` while
    /// still holding the lock.
    pub fn collect_with<T>(
        &self,
        read: impl FnOnce(&MetricRegistry, &CycleOutcome) -> T,
    ) -> Result<T> {
        let mut registry = self.registry.lock().map_err(|_| Error::LockPoisoned)?;

        let outcome = SnapshotCollector::new(self.reader.as_ref(), self.policy)
            .run_cycle(&mut registry)?;
        tracing::debug!(
            devices = self.reader.devices().len(),
            healthy = outcome.is_healthy(),
            "Collection cycle finished"
        );

        Ok(read(&registry, &outcome))
    }

    /// Run one cycle and render the registry in the text exposition format.
    pub fn collect_and_render(&self) -> Result<String> {
        self.collect_with(|registry, _| registry.render())
    }
}
