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

use nvml_wrapper::enum_wrappers::device::TemperatureSensor;
use nvml_wrapper::{Device, Nvml};

use crate::device::{DeviceIdentity, DeviceReader, MemoryInfo, Temperature, Utilization};
use crate::error::{DeviceError, Error, Result};

/// NVML-backed device reader.
///
/// Owns the NVML handle for the process lifetime; NVML is shut down when the
/// reader is dropped.
pub struct NvidiaDeviceReader {
    nvml: Nvml,
    devices: Vec<DeviceIdentity>,
}

impl NvidiaDeviceReader {
    /// Initialize NVML and enumerate every visible device.
    ///
    /// Fails if NVML cannot be loaded, if any device cannot be identified,
    /// or if no devices are present.
    pub fn new() -> Result<Self> {
        let nvml = Nvml::init().map_err(|e| Error::PlatformInit(e.to_string()))?;
        let devices = enumerate_devices(&nvml)?;
        tracing::info!("NVML found {} GPU(s)", devices.len());
        Ok(Self { nvml, devices })
    }

    fn device(&self, identity: &DeviceIdentity) -> std::result::Result<Device<'_>, DeviceError> {
        Ok(self.nvml.device_by_index(identity.index)?)
    }
}

fn enumerate_devices(nvml: &Nvml) -> Result<Vec<DeviceIdentity>> {
    let init_err = |e: nvml_wrapper::error::NvmlError| Error::PlatformInit(e.to_string());

    let count = nvml.device_count().map_err(init_err)?;
    if count == 0 {
        return Err(Error::NoDevicesFound);
    }

    let mut devices = Vec::with_capacity(count as usize);
    for index in 0..count {
        let device = nvml.device_by_index(index).map_err(init_err)?;
        let uuid = device.uuid().map_err(init_err)?;
        let name = device.name().map_err(init_err)?;
        tracing::debug!("Enumerated GPU {index}: {name} ({uuid})");
        devices.push(DeviceIdentity::new(index, uuid, name));
    }
    Ok(devices)
}

impl DeviceReader for NvidiaDeviceReader {
    fn devices(&self) -> &[DeviceIdentity] {
        &self.devices
    }

    fn get_utilization(
        &self,
        identity: &DeviceIdentity,
    ) -> std::result::Result<Utilization, DeviceError> {
        let rates = self.device(identity)?.utilization_rates()?;
        Ok(Utilization {
            gpu_percent: rates.gpu,
            memory_percent: rates.memory,
        })
    }

    fn get_temperature(
        &self,
        identity: &DeviceIdentity,
    ) -> std::result::Result<Temperature, DeviceError> {
        let celsius = self
            .device(identity)?
            .temperature(TemperatureSensor::Gpu)?;
        Ok(Temperature::from_celsius(celsius))
    }

    fn get_power_usage(&self, identity: &DeviceIdentity) -> std::result::Result<u32, DeviceError> {
        // NVML reports milliwatts
        let milliwatts = self.device(identity)?.power_usage()?;
        Ok(milliwatts / 1000)
    }

    fn get_memory_info(
        &self,
        identity: &DeviceIdentity,
    ) -> std::result::Result<MemoryInfo, DeviceError> {
        let memory = self.device(identity)?.memory_info()?;
        Ok(MemoryInfo {
            free: memory.free,
            total: memory.total,
            used: memory.used,
        })
    }
}
