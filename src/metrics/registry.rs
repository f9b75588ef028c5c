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

//! Labeled gauge vectors and the registry that owns them.
//!
//! The registry itself does no locking. Callers that share it across
//! threads wrap the whole registry in one lock so that readers never see a
//! half-reset or half-populated state.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::builder::MetricBuilder;
use super::catalog::{MetricDef, UP};
use crate::error::RegistryError;

/// Fully qualified description of one exported metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDesc {
    /// Name including the namespace prefix, e.g. `nvml_gpu_percent`.
    pub name: String,
    pub help: String,
    pub labels: Vec<String>,
}

impl MetricDesc {
    fn from_def(namespace: &str, def: &MetricDef) -> Result<Self, RegistryError> {
        let name = if namespace.is_empty() {
            def.name.to_string()
        } else {
            format!("{namespace}_{}", def.name)
        };
        if !is_valid_metric_name(&name) {
            return Err(RegistryError::InvalidMetricName(name));
        }

        let mut seen = HashSet::new();
        for label in def.labels {
            if !is_valid_label_name(label) || !seen.insert(*label) {
                return Err(RegistryError::InvalidMetricName(format!("{name}{{{label}}}")));
            }
        }

        Ok(Self {
            name,
            help: def.help.to_string(),
            labels: def.labels.iter().map(|l| l.to_string()).collect(),
        })
    }
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    !name.starts_with("__") && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A gauge vector: at most one value per label-value tuple.
#[derive(Debug, Clone)]
pub struct GaugeVec {
    desc: MetricDesc,
    series: BTreeMap<Vec<String>, f64>,
}

impl GaugeVec {
    pub fn new(desc: MetricDesc) -> Self {
        Self {
            desc,
            series: BTreeMap::new(),
        }
    }

    pub fn desc(&self) -> &MetricDesc {
        &self.desc
    }

    /// Upsert the value for one label-value tuple.
    pub fn set<S: AsRef<str>>(&mut self, label_values: &[S], value: f64) -> Result<(), RegistryError> {
        if label_values.len() != self.desc.labels.len() {
            return Err(RegistryError::LabelArity {
                metric: self.desc.name.clone(),
                expected: self.desc.labels.len(),
                got: label_values.len(),
            });
        }
        let key = label_values.iter().map(|v| v.as_ref().to_string()).collect();
        self.series.insert(key, value);
        Ok(())
    }

    pub fn get<S: AsRef<str>>(&self, label_values: &[S]) -> Option<f64> {
        let key: Vec<String> = label_values.iter().map(|v| v.as_ref().to_string()).collect();
        self.series.get(&key).copied()
    }

    pub fn reset(&mut self) {
        self.series.clear();
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Series in ascending label-value order.
    pub fn iter(&self) -> impl Iterator<Item = (&[String], f64)> {
        self.series.iter().map(|(k, v)| (k.as_slice(), *v))
    }
}

/// One metric and its current series, as handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily<'a> {
    pub desc: &'a MetricDesc,
    pub samples: Vec<(&'a [String], f64)>,
}

/// Named gauge vectors built once from a fixed catalog, plus the health gauge.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    gauges: Vec<GaugeVec>,
    by_name: HashMap<String, usize>,
    up: GaugeVec,
}

impl MetricRegistry {
    /// Create one empty gauge vector per catalog entry.
    ///
    /// `name` keys in the catalog are short names; exported names are
    /// prefixed with `namespace`. Duplicate names, including a clash with
    /// the health gauge, are rejected.
    pub fn register(namespace: &str, catalog: &[MetricDef]) -> Result<Self, RegistryError> {
        let up = GaugeVec::new(MetricDesc::from_def(namespace, &UP)?);

        let mut gauges = Vec::with_capacity(catalog.len());
        let mut by_name = HashMap::with_capacity(catalog.len());
        for def in catalog {
            if def.name == UP.name || by_name.contains_key(def.name) {
                return Err(RegistryError::DuplicateMetric(def.name.to_string()));
            }
            by_name.insert(def.name.to_string(), gauges.len());
            gauges.push(GaugeVec::new(MetricDesc::from_def(namespace, def)?));
        }

        let mut registry = Self {
            gauges,
            by_name,
            up,
        };
        registry.set_health(true);
        Ok(registry)
    }

    /// Drop every series from every gauge vector. The health gauge is kept.
    pub fn reset(&mut self) {
        for gauge in &mut self.gauges {
            gauge.reset();
        }
    }

    /// Upsert one series of the metric registered under the short `name`.
    pub fn set_value<S: AsRef<str>>(
        &mut self,
        name: &str,
        label_values: &[S],
        value: f64,
    ) -> Result<(), RegistryError> {
        let index = *self
            .by_name
            .get(name)
            .ok_or_else(|| RegistryError::UnknownMetric(name.to_string()))?;
        self.gauges[index].set(label_values, value)
    }

    pub fn gauge(&self, name: &str) -> Option<&GaugeVec> {
        self.by_name.get(name).map(|&index| &self.gauges[index])
    }

    pub fn set_health(&mut self, healthy: bool) {
        let value = if healthy { 1.0 } else { 0.0 };
        self.up.series.insert(Vec::new(), value);
    }

    pub fn health(&self) -> f64 {
        self.up.get::<&str>(&[]).unwrap_or(0.0)
    }

    /// True when no gauge vector holds any series.
    pub fn is_empty(&self) -> bool {
        self.gauges.iter().all(GaugeVec::is_empty)
    }

    /// Descriptors of every exported metric; the health gauge comes last.
    pub fn describe(&self) -> Vec<&MetricDesc> {
        self.gauges
            .iter()
            .map(GaugeVec::desc)
            .chain(std::iter::once(self.up.desc()))
            .collect()
    }

    /// Current values of every exported metric; the health gauge comes last.
    pub fn export_all(&self) -> Vec<MetricFamily<'_>> {
        self.gauges
            .iter()
            .chain(std::iter::once(&self.up))
            .map(|gauge| MetricFamily {
                desc: gauge.desc(),
                samples: gauge.iter().collect(),
            })
            .collect()
    }

    /// Render in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut builder = MetricBuilder::new();
        for family in self.export_all() {
            let desc = family.desc;
            builder.help(&desc.name, &desc.help).type_(&desc.name, "gauge");
            for (values, value) in family.samples {
                let labels: Vec<(&str, &str)> = desc
                    .labels
                    .iter()
                    .map(String::as_str)
                    .zip(values.iter().map(String::as_str))
                    .collect();
                builder.metric(&desc.name, &labels, value);
            }
        }
        builder.build()
    }
}
