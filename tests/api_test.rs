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

//! End-to-end tests of the scrape server over a real TCP listener.

use std::net::SocketAddr;
use std::sync::Arc;

use nvml_exporter::api::{router, serve};
use nvml_exporter::device::{FakeDeviceReader, FakeReading, QueryClass, Temperature, Utilization};
use nvml_exporter::{DeviceIdentity, Exporter, ExporterConfig};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct TestServer {
    addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

async fn start(reader: FakeDeviceReader, config: ExporterConfig) -> TestServer {
    start_on(reader, config, "127.0.0.1:0").await
}

async fn start_on(reader: FakeDeviceReader, config: ExporterConfig, bind: &str) -> TestServer {
    let exporter = Exporter::new(Box::new(reader), config.failure_policy).unwrap();
    let app = router(Arc::new(exporter), &config);

    let listener = TcpListener::bind(bind).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(serve(listener, app, async move {
        let _ = rx.await;
    }));

    TestServer {
        addr,
        _shutdown: tx,
    }
}

fn two_gpus() -> FakeDeviceReader {
    let reading = FakeReading {
        utilization: Utilization {
            gpu_percent: 80,
            memory_percent: 25,
        },
        temperature: Temperature::from_celsius(60),
        power_watts: 250,
        ..Default::default()
    };
    FakeDeviceReader::new(vec![
        (DeviceIdentity::new(0, "GPU-0", "NVIDIA H100"), reading),
        (DeviceIdentity::new(1, "GPU-1", "NVIDIA H100"), reading),
    ])
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let server = start(two_gpus(), ExporterConfig::default()).await;

    let response = reqwest::get(server.url("/metrics")).await.unwrap();
    assert_eq!(response.status(), 200);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain; version=0.0.4"));

    let body = response.text().await.unwrap();
    assert!(body.contains(
        "nvml_power_watts{device_id=\"1\",device_uuid=\"GPU-1\",device_name=\"NVIDIA H100\"} 250\n"
    ));
    assert!(body.contains(
        "nvml_temperature_fahrenheit{device_id=\"0\",device_uuid=\"GPU-0\",device_name=\"NVIDIA H100\"} 140\n"
    ));
    assert!(body.ends_with("nvml_up 1\n"));
}

#[tokio::test]
async fn test_host_name_listen_address() {
    let config = ExporterConfig {
        listen_address: "localhost:0".to_string(),
        ..Default::default()
    };
    config.validate().unwrap();
    let server = start_on(two_gpus(), config.clone(), &config.listen_address).await;

    let response = reqwest::get(server.url("/metrics")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().ends_with("nvml_up 1\n"));
}

#[tokio::test]
async fn test_degraded_scrape_still_succeeds() {
    let reader = two_gpus();
    reader.fail(0, QueryClass::PowerUsage);
    let server = start(reader, ExporterConfig::default()).await;

    let response = reqwest::get(server.url("/metrics")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.ends_with("nvml_up 0\n"));
    assert!(!body.contains("device_id="));
}

#[tokio::test]
async fn test_custom_metrics_path_and_landing_page() {
    let config = ExporterConfig {
        metrics_path: "/gpu".to_string(),
        ..Default::default()
    };
    let server = start(two_gpus(), config).await;

    let metrics = reqwest::get(server.url("/gpu")).await.unwrap();
    assert_eq!(metrics.status(), 200);
    assert!(metrics.text().await.unwrap().contains("nvml_gpu_percent"));

    for path in ["/", "/metrics", "/anything/else"] {
        let page = reqwest::get(server.url(path)).await.unwrap();
        assert_eq!(page.status(), 200, "{path}");
        let html = page.text().await.unwrap();
        assert!(html.contains("<h1>NVML Exporter</h1>"), "{path}");
        assert!(html.contains("<a href='/gpu'>Metrics</a>"), "{path}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scrapes_each_get_a_full_snapshot() {
    let reader = two_gpus().with_cycle_stamp();
    let server = start(reader, ExporterConfig::default()).await;

    let requests: Vec<_> = (0..8)
        .map(|_| {
            let url = server.url("/metrics");
            tokio::spawn(async move { reqwest::get(url).await.unwrap().text().await.unwrap() })
        })
        .collect();

    for request in requests {
        let body = request.await.unwrap();
        let values: Vec<&str> = body
            .lines()
            .filter(|line| line.starts_with("nvml_") && line.contains("device_id="))
            .filter_map(|line| line.rsplit(' ').next())
            .collect();
        assert_eq!(values.len(), 16);
        assert!(values.iter().all(|v| *v == values[0]), "mixed cycle: {values:?}");
    }
}
