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

use std::sync::Arc;

use crate::device::{DeviceIdentity, MemoryInfo, Temperature, Utilization};
use crate::error::DeviceError;

/// Read-only telemetry queries against a fixed set of enumerated devices.
///
/// Every call is synchronous and may block inside the management library.
pub trait DeviceReader: Send + Sync {
    /// Devices in enumeration order. Fixed for the lifetime of the reader.
    fn devices(&self) -> &[DeviceIdentity];

    fn get_utilization(&self, device: &DeviceIdentity) -> Result<Utilization, DeviceError>;

    fn get_temperature(&self, device: &DeviceIdentity) -> Result<Temperature, DeviceError>;

    /// Current board power draw in whole watts.
    fn get_power_usage(&self, device: &DeviceIdentity) -> Result<u32, DeviceError>;

    fn get_memory_info(&self, device: &DeviceIdentity) -> Result<MemoryInfo, DeviceError>;
}

/// Lets callers keep a handle on a reader that the exporter owns.
impl<T: DeviceReader + ?Sized> DeviceReader for Arc<T> {
    fn devices(&self) -> &[DeviceIdentity] {
        (**self).devices()
    }

    fn get_utilization(&self, device: &DeviceIdentity) -> Result<Utilization, DeviceError> {
        (**self).get_utilization(device)
    }

    fn get_temperature(&self, device: &DeviceIdentity) -> Result<Temperature, DeviceError> {
        (**self).get_temperature(device)
    }

    fn get_power_usage(&self, device: &DeviceIdentity) -> Result<u32, DeviceError> {
        (**self).get_power_usage(device)
    }

    fn get_memory_info(&self, device: &DeviceIdentity) -> Result<MemoryInfo, DeviceError> {
        (**self).get_memory_info(device)
    }
}
