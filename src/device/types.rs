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

use std::fmt;

/// Stable identity of one enumerated accelerator.
///
/// Enumerated once at startup and never changed afterwards. Every
/// device-scoped series is labeled with `(index, uuid, name)` in that order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    pub index: u32,
    pub uuid: String,
    pub name: String,
}

impl DeviceIdentity {
    pub fn new(index: u32, uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index,
            uuid: uuid.into(),
            name: name.into(),
        }
    }

    /// Label values in catalog schema order: index as decimal, uuid, name.
    pub fn label_values(&self) -> [String; 3] {
        [self.index.to_string(), self.uuid.clone(), self.name.clone()]
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPU {} ({})", self.index, self.uuid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Utilization {
    pub gpu_percent: u32,
    pub memory_percent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Temperature {
    pub fahrenheit: u32,
    pub celsius: u32,
}

impl Temperature {
    /// Build from a Celsius reading, deriving Fahrenheit with integer math.
    pub fn from_celsius(celsius: u32) -> Self {
        Self {
            fahrenheit: celsius * 9 / 5 + 32,
            celsius,
        }
    }
}

/// The four telemetry query classes issued per device, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryClass {
    Utilization,
    Temperature,
    PowerUsage,
    MemoryInfo,
}

impl QueryClass {
    pub const ALL: [QueryClass; 4] = [
        QueryClass::Utilization,
        QueryClass::Temperature,
        QueryClass::PowerUsage,
        QueryClass::MemoryInfo,
    ];
}

impl fmt::Display for QueryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryClass::Utilization => "utilization",
            QueryClass::Temperature => "temperature",
            QueryClass::PowerUsage => "power usage",
            QueryClass::MemoryInfo => "memory info",
        };
        f.write_str(name)
    }
}

/// Device memory in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryInfo {
    pub free: u64,
    pub total: u64,
    pub used: u64,
}
