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

//! Scripted in-memory device reader.
//!
//! Compiled for unit tests and behind the `fake` feature, for integration
//! tests and library users who want to exercise the collector without NVML. Failures can be injected per `(device, query)`
//! pair and toggled between scrapes.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::device::{
    DeviceIdentity, DeviceReader, MemoryInfo, QueryClass, Temperature, Utilization,
};
use crate::error::DeviceError;

/// Values a fake device reports when its queries succeed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FakeReading {
    pub utilization: Utilization,
    pub temperature: Temperature,
    pub power_watts: u32,
    pub memory: MemoryInfo,
}

pub struct FakeDeviceReader {
    devices: Vec<DeviceIdentity>,
    readings: Vec<FakeReading>,
    failures: Mutex<HashSet<(u32, QueryClass)>>,
    calls: Mutex<Vec<(u32, QueryClass)>>,
    delay: Option<Duration>,
    cycle_stamp: Option<AtomicU32>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FakeDeviceReader {
    pub fn new(devices: Vec<(DeviceIdentity, FakeReading)>) -> Self {
        let (devices, readings) = devices.into_iter().unzip();
        Self {
            devices,
            readings,
            failures: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
            cycle_stamp: None,
        }
    }

    /// Sleep before answering every query.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report a per-cycle stamp instead of the scripted readings.
    ///
    /// The stamp increments whenever the first device's utilization is
    /// queried, so every value written during one cycle carries the same
    /// number. Used to detect interleaved cycles.
    pub fn with_cycle_stamp(mut self) -> Self {
        self.cycle_stamp = Some(AtomicU32::new(0));
        self
    }

    /// Make `query` fail for the device at `index` until recovered.
    pub fn fail(&self, index: u32, query: QueryClass) {
        lock(&self.failures).insert((index, query));
    }

    /// Make every query class fail for the device at `index`.
    pub fn fail_all(&self, index: u32) {
        let mut failures = lock(&self.failures);
        for query in QueryClass::ALL {
            failures.insert((index, query));
        }
    }

    pub fn recover(&self, index: u32, query: QueryClass) {
        lock(&self.failures).remove(&(index, query));
    }

    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Every query issued so far, in order.
    pub fn calls(&self) -> Vec<(u32, QueryClass)> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn query(&self, device: &DeviceIdentity, query: QueryClass) -> Result<FakeReading, DeviceError> {
        lock(&self.calls).push((device.index, query));

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if lock(&self.failures).contains(&(device.index, query)) {
            return Err(DeviceError::Query(format!(
                "injected {query} failure on GPU {}",
                device.index
            )));
        }

        let position = self
            .devices
            .iter()
            .position(|d| d == device)
            .ok_or_else(|| DeviceError::Query(format!("unknown device {device}")))?;

        if let Some(stamp) = &self.cycle_stamp {
            if position == 0 && query == QueryClass::Utilization {
                stamp.fetch_add(1, Ordering::SeqCst);
            }
            return Ok(stamped_reading(stamp.load(Ordering::SeqCst)));
        }

        Ok(self.readings[position])
    }
}

fn stamped_reading(stamp: u32) -> FakeReading {
    let bytes = u64::from(stamp);
    FakeReading {
        utilization: Utilization {
            gpu_percent: stamp,
            memory_percent: stamp,
        },
        temperature: Temperature {
            fahrenheit: stamp,
            celsius: stamp,
        },
        power_watts: stamp,
        memory: MemoryInfo {
            free: bytes,
            total: bytes,
            used: bytes,
        },
    }
}

impl DeviceReader for FakeDeviceReader {
    fn devices(&self) -> &[DeviceIdentity] {
        &self.devices
    }

    fn get_utilization(&self, device: &DeviceIdentity) -> Result<Utilization, DeviceError> {
        Ok(self.query(device, QueryClass::Utilization)?.utilization)
    }

    fn get_temperature(&self, device: &DeviceIdentity) -> Result<Temperature, DeviceError> {
        Ok(self.query(device, QueryClass::Temperature)?.temperature)
    }

    fn get_power_usage(&self, device: &DeviceIdentity) -> Result<u32, DeviceError> {
        Ok(self.query(device, QueryClass::PowerUsage)?.power_watts)
    }

    fn get_memory_info(&self, device: &DeviceIdentity) -> Result<MemoryInfo, DeviceError> {
        Ok(self.query(device, QueryClass::MemoryInfo)?.memory)
    }
}
