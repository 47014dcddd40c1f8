// Licensed to the Apache Software Foundation (ASF) under one or more
// contributor license agreements.  See the NOTICE file distributed with
// this work for additional information regarding copyright ownership.
// The ASF licenses this file to You under the Apache License, Version 2.0
// (the "License"); you may not use this file except in compliance with
// the License.  You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Periodic process-metric sampling, reported as typed meters alongside
//! traces. go2sky's `MetricCollector` reads Go-runtime counters (heap,
//! goroutine count, GC pauses); Rust has no tracing garbage collector and no
//! public global task counter, so several of these are deliberate
//! substitutions, recorded in DESIGN.md rather than silently dropped.

use crate::common::time::{TimeFetcher, UnixTimeStampFetcher};
use crate::skywalking_proto::v3::{meter_data, Label, MeterData, MeterSingleValue};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Incremented/decremented by each segment's collector task for the
/// duration of its lifetime; stands in for "live goroutine count" since
/// Tokio exposes no public global task counter.
pub static LIVE_SEGMENT_COLLECTORS: AtomicUsize = AtomicUsize::new(0);

const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

pub struct RuntimeMetricCollector {
    service: String,
    service_instance: String,
    meter_tx: mpsc::Sender<MeterData>,
    cancellation: CancellationToken,
    interval: Duration,
}

impl RuntimeMetricCollector {
    pub fn new(
        service: String,
        service_instance: String,
        meter_tx: mpsc::Sender<MeterData>,
        cancellation: CancellationToken,
    ) -> Self {
        RuntimeMetricCollector {
            service,
            service_instance,
            meter_tx,
            cancellation,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Zero or negative disables collection entirely.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn run(self) {
        if self.interval.is_zero() {
            return;
        }
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // A panic sampling one tick's metrics must not take the
                    // whole collector down with it.
                    let result = AssertUnwindSafe(async { self.collect_and_send() })
                        .catch_unwind()
                        .await;
                    if result.is_err() {
                        error!("runtime metric collection panicked; continuing on the next tick");
                    }
                }
                _ = self.cancellation.cancelled() => break,
            }
        }
    }

    fn collect_and_send(&self) {
        let timestamp = UnixTimeStampFetcher.get();
        for (name, value) in Self::sample() {
            let meter = MeterData {
                service: self.service.clone(),
                service_instance: self.service_instance.clone(),
                timestamp,
                metric: Some(meter_data::Metric::SingleValue(MeterSingleValue {
                    name: name.to_string(),
                    labels: Vec::<Label>::new(),
                    value,
                })),
            };
            if self.meter_tx.try_send(meter).is_err() {
                warn!(metric = name, "meter queue full or closed, metric dropped");
            }
        }
    }

    #[cfg(target_os = "linux")]
    fn sample() -> Vec<(&'static str, f64)> {
        let mut samples = vec![
            // Rust's ownership model has no tracing GC to sample.
            ("instance.gc_count", 0.0),
            ("instance.gc_pause_time_ms", 0.0),
            // Tokio tasks share OS thread stacks; there is no separate
            // per-task stack to account for.
            ("instance.stack_in_use", 0.0),
            (
                "instance.live_coroutine_count",
                LIVE_SEGMENT_COLLECTORS.load(Ordering::Relaxed) as f64,
            ),
        ];

        match procfs::process::Process::myself() {
            Ok(process) => {
                let heap_alloc = process
                    .status()
                    .ok()
                    .and_then(|status| status.vmrss)
                    .map(|kb| kb as f64 * 1024.0)
                    .unwrap_or(0.0);
                samples.push(("instance.heap_alloc", heap_alloc));

                match process.stat() {
                    Ok(stat) => {
                        samples.push(("instance.os_thread_count", stat.num_threads as f64));
                        samples.push(("instance.cpu_used_rate", (stat.utime + stat.stime) as f64));
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to read process stat via procfs");
                        samples.push(("instance.os_thread_count", 0.0));
                        samples.push(("instance.cpu_used_rate", 0.0));
                    }
                }

                let mem_used_rate = procfs::Meminfo::new()
                    .ok()
                    .map(|meminfo| {
                        let available = meminfo.mem_available.unwrap_or(meminfo.mem_free);
                        let used = meminfo.mem_total.saturating_sub(available);
                        used as f64 / meminfo.mem_total.max(1) as f64
                    })
                    .unwrap_or(0.0);
                samples.push(("instance.mem_used_rate", mem_used_rate));
            }
            Err(err) => {
                error!(error = %err, "failed to read /proc/self via procfs, reporting zeroed process metrics");
                samples.push(("instance.heap_alloc", 0.0));
                samples.push(("instance.os_thread_count", 0.0));
                samples.push(("instance.cpu_used_rate", 0.0));
                samples.push(("instance.mem_used_rate", 0.0));
            }
        }

        samples
    }

    #[cfg(not(target_os = "linux"))]
    fn sample() -> Vec<(&'static str, f64)> {
        vec![
            ("instance.gc_count", 0.0),
            ("instance.gc_pause_time_ms", 0.0),
            ("instance.stack_in_use", 0.0),
            (
                "instance.live_coroutine_count",
                LIVE_SEGMENT_COLLECTORS.load(Ordering::Relaxed) as f64,
            ),
            ("instance.heap_alloc", 0.0),
            ("instance.os_thread_count", 0.0),
            ("instance.cpu_used_rate", 0.0),
            ("instance.mem_used_rate", 0.0),
        ]
    }
}
