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

//! Boots and drives the three reporter streams (trace/meter/log), the
//! keepalive loop, and the configuration-discovery pull loop over one
//! shared gRPC channel. Each stream reconnects with a fixed backoff on
//! failure; queues are bounded and producers drop on overflow rather than
//! block (see `crate::reporter::try_send_or_drop`).

use crate::config_discovery::ConfigurationDiscoveryService;
use crate::metrics::RuntimeMetricCollector;
use crate::reporter::{ReporterQueues, DEFAULT_QUEUE_CAPACITY};
use crate::skywalking_proto::v3::configuration_discovery_service_client::ConfigurationDiscoveryServiceClient;
use crate::skywalking_proto::v3::log_report_service_client::LogReportServiceClient;
use crate::skywalking_proto::v3::management_service_client::ManagementServiceClient;
use crate::skywalking_proto::v3::meter_report_service_client::MeterReportServiceClient;
use crate::skywalking_proto::v3::trace_segment_report_service_client::TraceSegmentReportServiceClient;
use crate::skywalking_proto::v3::{
    ConfigurationSyncRequest, InstancePingPkg, InstanceProperties, KeyStringValuePair, LogData, MeterData,
    SegmentObject,
};
use crate::error::{AgentError, Result as AgentResult};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tracing::{info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(20);
const DEFAULT_CDS_INTERVAL: Duration = Duration::from_secs(20);

const SW_AGENT_AUTHENTICATION_ENV: &str = "SW_AGENT_AUTHENTICATION";
const SW_AGENT_LAYER_ENV: &str = "SW_AGENT_LAYER";
const SW_AGENT_COLLECTOR_HEARTBEAT_PERIOD_ENV: &str = "SW_AGENT_COLLECTOR_HEARTBEAT_PERIOD";
const SW_AGENT_COLLECTOR_CDS_INTERVAL_ENV: &str = "SW_AGENT_COLLECTOR_GET_AGENT_DYNAMIC_CONFIG_INTERVAL";
const SW_AGENT_COLLECTOR_BACKEND_SERVICES_ENV: &str = "SW_AGENT_COLLECTOR_BACKEND_SERVICES";
const SW_AGENT_COLLECTOR_MAX_SEND_QUEUE_SIZE_ENV: &str = "SW_AGENT_COLLECTOR_MAX_SEND_QUEUE_SIZE";
const SW_AGENT_PROCESS_STATUS_HOOK_ENABLE_ENV: &str = "SW_AGENT_PROCESS_STATUS_HOOK_ENABLE";
const SW_AGENT_PROCESS_LABELS_ENV: &str = "SW_AGENT_PROCESS_LABELS";

pub type ReportStrategy = dyn Fn(&SegmentObject) -> bool + Send + Sync;

pub struct GrpcReporterOptions {
    pub collector_address: String,
    pub check_interval: Duration,
    pub cds_interval: Option<Duration>,
    pub queue_capacity: usize,
    pub instance_properties: Vec<KeyStringValuePair>,
    pub report_strategy: Option<Arc<ReportStrategy>>,
    /// Sent as the `authentication` gRPC metadata key on every outgoing
    /// request when set, the same token go2sky's `WithAuthentication`
    /// reporter option attaches.
    pub auth: Option<String>,
    /// Reported as a `layer` entry in `InstanceProperties.layer`.
    pub layer: Option<String>,
    /// Accepted for wire-option parity with go2sky's reporter; writing the
    /// eBPF process-metadata file it controls is out of scope here, so this
    /// is stored but otherwise inert.
    pub process_status_hook: bool,
    /// Same as `process_status_hook`: accepted, stored, not acted on.
    pub process_labels: Vec<String>,
}

impl GrpcReporterOptions {
    pub fn new(collector_address: impl Into<String>) -> Self {
        GrpcReporterOptions {
            collector_address: collector_address.into(),
            check_interval: DEFAULT_CHECK_INTERVAL,
            cds_interval: Some(DEFAULT_CDS_INTERVAL),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            instance_properties: Vec::new(),
            report_strategy: None,
            auth: None,
            layer: None,
            process_status_hook: false,
            process_labels: Vec::new(),
        }
    }

    /// Builds options from `collector_address`, then lets
    /// `SW_AGENT_AUTHENTICATION`, `SW_AGENT_LAYER`,
    /// `SW_AGENT_COLLECTOR_HEARTBEAT_PERIOD`,
    /// `SW_AGENT_COLLECTOR_GET_AGENT_DYNAMIC_CONFIG_INTERVAL`,
    /// `SW_AGENT_COLLECTOR_BACKEND_SERVICES`,
    /// `SW_AGENT_COLLECTOR_MAX_SEND_QUEUE_SIZE`,
    /// `SW_AGENT_PROCESS_STATUS_HOOK_ENABLE`, and `SW_AGENT_PROCESS_LABELS`
    /// override it, mirroring go2sky's `gRPCReporterOptionsFormEnv`. A
    /// variable only takes effect when set and non-empty; a set-but-invalid
    /// value is a `ConfigParse` error rather than a silent fallback.
    pub fn from_env(collector_address: impl Into<String>) -> AgentResult<Self> {
        let mut options = Self::new(collector_address);

        if let Some(address) = non_empty_env(SW_AGENT_COLLECTOR_BACKEND_SERVICES_ENV) {
            options.collector_address = address;
        }
        if let Some(auth) = non_empty_env(SW_AGENT_AUTHENTICATION_ENV) {
            options.auth = Some(auth);
        }
        if let Some(layer) = non_empty_env(SW_AGENT_LAYER_ENV) {
            options.layer = Some(layer);
        }
        if let Some(seconds) = non_empty_env(SW_AGENT_COLLECTOR_HEARTBEAT_PERIOD_ENV) {
            options.check_interval = Duration::from_secs(parse_env(SW_AGENT_COLLECTOR_HEARTBEAT_PERIOD_ENV, &seconds)?);
        }
        if let Some(seconds) = non_empty_env(SW_AGENT_COLLECTOR_CDS_INTERVAL_ENV) {
            let seconds: i64 = parse_env(SW_AGENT_COLLECTOR_CDS_INTERVAL_ENV, &seconds)?;
            options.cds_interval = if seconds <= 0 { None } else { Some(Duration::from_secs(seconds as u64)) };
        }
        if let Some(size) = non_empty_env(SW_AGENT_COLLECTOR_MAX_SEND_QUEUE_SIZE_ENV) {
            options.queue_capacity = parse_env(SW_AGENT_COLLECTOR_MAX_SEND_QUEUE_SIZE_ENV, &size)?;
        }
        if let Some(enabled) = non_empty_env(SW_AGENT_PROCESS_STATUS_HOOK_ENABLE_ENV) {
            options.process_status_hook = parse_env(SW_AGENT_PROCESS_STATUS_HOOK_ENABLE_ENV, &enabled)?;
        }
        if let Some(labels) = non_empty_env(SW_AGENT_PROCESS_LABELS_ENV) {
            options.process_labels = labels.split(',').map(|label| label.trim().to_string()).collect();
        }

        Ok(options)
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn with_cds_interval(mut self, interval: Option<Duration>) -> Self {
        self.cds_interval = interval;
        self
    }

    pub fn with_max_queue_size(mut self, size: usize) -> Self {
        self.queue_capacity = size;
        self
    }

    pub fn with_instance_properties(mut self, props: Vec<KeyStringValuePair>) -> Self {
        self.instance_properties = props;
        self
    }

    pub fn with_report_strategy(mut self, strategy: Arc<ReportStrategy>) -> Self {
        self.report_strategy = Some(strategy);
        self
    }

    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn with_process_status_hook(mut self, enabled: bool) -> Self {
        self.process_status_hook = enabled;
        self
    }

    pub fn with_process_labels(mut self, labels: Vec<String>) -> Self {
        self.process_labels = labels;
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// `InstanceProperties.layer` is `repeated KeyStringValuePair`, not a plain
/// string list, so the single `SW_AGENT_LAYER` value is wrapped as one
/// entry rather than reinterpreted as a list.
fn layer_as_properties(layer: &Option<String>) -> Vec<KeyStringValuePair> {
    layer
        .as_ref()
        .map(|value| vec![KeyStringValuePair { key: "layer".to_string(), value: value.clone() }])
        .unwrap_or_default()
}

fn parse_env<F: std::str::FromStr>(key: &str, value: &str) -> AgentResult<F> {
    value
        .parse()
        .map_err(|_| AgentError::ConfigParse(format!("{key}={value:?} is not valid")))
}

/// Attaches `options.auth`, if set, to every outgoing request as the
/// `authentication` gRPC metadata key, the same header go2sky's
/// `WithAuthentication` reporter option sends.
#[derive(Clone)]
struct AuthInterceptor {
    token: Option<Arc<str>>,
}

impl tonic::service::Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: tonic::Request<()>) -> std::result::Result<tonic::Request<()>, tonic::Status> {
        if let Some(token) = &self.token {
            let value = token
                .parse()
                .map_err(|_| tonic::Status::invalid_argument("SW_AGENT_AUTHENTICATION is not valid ascii metadata"))?;
            request.metadata_mut().insert("authentication", value);
        }
        Ok(request)
    }
}

/// The local outbound-interface IPv4 address, discovered without sending
/// any traffic (a UDP "connect" only resolves routing). Empty when no
/// route is available; this is observability metadata, not
/// correctness-critical.
fn local_ipv4_address() -> Option<String> {
    use std::net::UdpSocket;
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    Some(socket.local_addr().ok()?.ip().to_string())
}

/// Best-effort OS/hostname/language/ipv4 properties attached to the first
/// `ReportInstanceProperties` call, the same metadata go2sky's
/// `service.go` gathers via `os.Hostname()` and build tags.
pub fn default_instance_properties() -> Vec<KeyStringValuePair> {
    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    let mut properties = vec![
        KeyStringValuePair {
            key: "language".to_string(),
            value: "rust".to_string(),
        },
        KeyStringValuePair {
            key: "os_name".to_string(),
            value: std::env::consts::OS.to_string(),
        },
        KeyStringValuePair {
            key: "hostname".to_string(),
            value: hostname,
        },
    ];

    if let Some(ipv4) = local_ipv4_address() {
        properties.push(KeyStringValuePair {
            key: "ipv4".to_string(),
            value: ipv4,
        });
    }

    properties
}

pub struct GrpcReporter {
    cancellation: CancellationToken,
}

impl GrpcReporter {
    /// Opens the gRPC channel and starts every background task: the
    /// trace/meter/log stream tasks, the keepalive task, the
    /// configuration-discovery pull task (if configured), and the runtime
    /// metric collector. Returns the bounded queues producers enqueue into.
    pub async fn boot(
        service: String,
        service_instance: String,
        options: GrpcReporterOptions,
        cds: Arc<ConfigurationDiscoveryService>,
    ) -> Result<(Self, ReporterQueues), tonic::transport::Error> {
        let channel = Channel::from_shared(options.collector_address.clone())
            .expect("collector address must be a valid URI")
            .connect()
            .await?;

        let cancellation = CancellationToken::new();
        let interceptor = AuthInterceptor { token: options.auth.clone().map(Arc::from) };

        let (trace_tx, trace_rx) = mpsc::channel::<SegmentObject>(options.queue_capacity);
        let (meter_tx, meter_rx) = mpsc::channel::<MeterData>(options.queue_capacity);
        let (log_tx, log_rx) = mpsc::channel::<LogData>(options.queue_capacity);

        tokio::spawn(run_trace_stream(
            channel.clone(),
            interceptor.clone(),
            trace_rx,
            options.report_strategy.clone(),
            cancellation.clone(),
        ));
        tokio::spawn(run_meter_stream(
            channel.clone(),
            interceptor.clone(),
            meter_rx,
            cancellation.clone(),
        ));
        tokio::spawn(run_log_stream(channel.clone(), interceptor.clone(), log_rx, cancellation.clone()));
        tokio::spawn(run_keepalive(
            channel.clone(),
            interceptor.clone(),
            service.clone(),
            service_instance.clone(),
            options.instance_properties.clone(),
            layer_as_properties(&options.layer),
            options.check_interval,
            cancellation.clone(),
        ));

        if let Some(interval) = options.cds_interval {
            tokio::spawn(run_cds_pull(
                channel.clone(),
                interceptor.clone(),
                service.clone(),
                cds,
                interval,
                cancellation.clone(),
            ));
        }

        tokio::spawn(
            RuntimeMetricCollector::new(service, service_instance, meter_tx.clone(), cancellation.clone()).run(),
        );

        Ok((GrpcReporter { cancellation }, ReporterQueues { trace_tx, meter_tx, log_tx }))
    }

    /// Fires the cancellation signal; stream tasks drain whatever remains
    /// queued and half-close, then exit. The channel is closed last as
    /// every task that holds it finishes.
    pub fn shutdown(&self) {
        self.cancellation.cancel();
    }
}

async fn run_trace_stream(
    channel: Channel,
    interceptor: AuthInterceptor,
    mut rx_owner: mpsc::Receiver<SegmentObject>,
    report_strategy: Option<Arc<ReportStrategy>>,
    cancellation: CancellationToken,
) {
    loop {
        let mut client = TraceSegmentReportServiceClient::with_interceptor(channel.clone(), interceptor.clone());
        let rx = &mut rx_owner;
        let report_strategy = report_strategy.clone();
        let cancellation = cancellation.clone();

        let outgoing = async_stream::stream! {
            loop {
                tokio::select! {
                    maybe_segment = rx.recv() => {
                        match maybe_segment {
                            Some(segment) => {
                                if report_strategy.as_ref().map(|f| f(&segment)).unwrap_or(true) {
                                    yield segment;
                                }
                            }
                            None => return,
                        }
                    }
                    _ = cancellation.cancelled() => {
                        rx.close();
                    }
                }
            }
        };

        // A panic unwinding out of this attempt (e.g. from a future the
        // generated client code polls) is caught at this task's root and
        // treated like any other transport failure: sleep, reconnect, retry.
        let attempt = AssertUnwindSafe(client.collect(outgoing)).catch_unwind().await;
        match attempt {
            Ok(Ok(_)) => break,
            Ok(Err(err)) => {
                warn!(error = %err, "trace segment stream closed, reconnecting in 5s");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
            Err(_) => {
                warn!("trace segment stream task panicked, reconnecting in 5s");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
    info!("trace segment stream task exiting");
}

async fn run_meter_stream(
    channel: Channel,
    interceptor: AuthInterceptor,
    mut rx_owner: mpsc::Receiver<MeterData>,
    cancellation: CancellationToken,
) {
    loop {
        let mut client = MeterReportServiceClient::with_interceptor(channel.clone(), interceptor.clone());
        let rx = &mut rx_owner;
        let cancellation = cancellation.clone();

        let outgoing = async_stream::stream! {
            loop {
                tokio::select! {
                    maybe_meter = rx.recv() => {
                        match maybe_meter {
                            Some(meter) => yield meter,
                            None => return,
                        }
                    }
                    _ = cancellation.cancelled() => {
                        rx.close();
                    }
                }
            }
        };

        let attempt = AssertUnwindSafe(client.collect(outgoing)).catch_unwind().await;
        match attempt {
            Ok(Ok(_)) => break,
            Ok(Err(err)) => {
                warn!(error = %err, "meter stream closed, reconnecting in 5s");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
            Err(_) => {
                warn!("meter stream task panicked, reconnecting in 5s");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
    info!("meter stream task exiting");
}

async fn run_log_stream(
    channel: Channel,
    interceptor: AuthInterceptor,
    mut rx_owner: mpsc::Receiver<LogData>,
    cancellation: CancellationToken,
) {
    loop {
        let mut client = LogReportServiceClient::with_interceptor(channel.clone(), interceptor.clone());
        let rx = &mut rx_owner;
        let cancellation = cancellation.clone();

        let outgoing = async_stream::stream! {
            loop {
                tokio::select! {
                    maybe_log = rx.recv() => {
                        match maybe_log {
                            Some(log) => yield log,
                            None => return,
                        }
                    }
                    _ = cancellation.cancelled() => {
                        rx.close();
                    }
                }
            }
        };

        let attempt = AssertUnwindSafe(client.collect(outgoing)).catch_unwind().await;
        match attempt {
            Ok(Ok(_)) => break,
            Ok(Err(err)) => {
                warn!(error = %err, "log stream closed, reconnecting in 5s");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
            Err(_) => {
                warn!("log stream task panicked, reconnecting in 5s");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
    info!("log stream task exiting");
}

async fn run_keepalive(
    channel: Channel,
    interceptor: AuthInterceptor,
    service: String,
    service_instance: String,
    instance_properties: Vec<KeyStringValuePair>,
    layer: Vec<KeyStringValuePair>,
    check_interval: Duration,
    cancellation: CancellationToken,
) {
    let mut client = ManagementServiceClient::with_interceptor(channel, interceptor);
    let mut properties_reported = false;
    let mut ticker = tokio::time::interval(check_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !properties_reported {
                    let request = InstanceProperties {
                        service: service.clone(),
                        service_instance: service_instance.clone(),
                        properties: instance_properties.clone(),
                        layer: layer.clone(),
                    };
                    match client.report_instance_properties(request).await {
                        Ok(_) => properties_reported = true,
                        Err(err) => warn!(error = %err, "failed to report instance properties"),
                    }
                } else {
                    let ping = InstancePingPkg {
                        service: service.clone(),
                        service_instance: service_instance.clone(),
                    };
                    if let Err(err) = client.keep_alive(ping).await {
                        warn!(error = %err, "keepalive ping failed");
                    }
                }
            }
            _ = cancellation.cancelled() => break,
        }
    }
    info!("keepalive task exiting");
}

async fn run_cds_pull(
    channel: Channel,
    interceptor: AuthInterceptor,
    service: String,
    cds: Arc<ConfigurationDiscoveryService>,
    interval: Duration,
    cancellation: CancellationToken,
) {
    let mut client = ConfigurationDiscoveryServiceClient::with_interceptor(channel, interceptor);
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let request = ConfigurationSyncRequest {
                    service: service.clone(),
                    uuid: cds.current_uuid(),
                };
                let attempt = AssertUnwindSafe(client.fetch_configurations(request)).catch_unwind().await;
                match attempt {
                    Ok(Ok(response)) => {
                        for command in response.into_inner().commands {
                            cds.handle_command(&command);
                        }
                    }
                    Ok(Err(err)) => warn!(error = %err, "configuration-discovery pull failed"),
                    Err(_) => warn!("configuration-discovery pull task panicked, continuing on the next tick"),
                }
            }
            _ = cancellation.cancelled() => break,
        }
    }
    info!("configuration-discovery pull task exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    // All SW_AGENT_* vars this module reads are exercised in one test and
    // cleared at the end, so no other test racing on the same process-wide
    // env can observe a half-set state.
    #[test]
    fn env_overrides_win_over_constructor_defaults() {
        std::env::set_var(SW_AGENT_COLLECTOR_BACKEND_SERVICES_ENV, "http://env-collector:11800");
        std::env::set_var(SW_AGENT_AUTHENTICATION_ENV, "env-token");
        std::env::set_var(SW_AGENT_LAYER_ENV, "rust-env");
        std::env::set_var(SW_AGENT_COLLECTOR_HEARTBEAT_PERIOD_ENV, "5");
        std::env::set_var(SW_AGENT_COLLECTOR_CDS_INTERVAL_ENV, "0");
        std::env::set_var(SW_AGENT_COLLECTOR_MAX_SEND_QUEUE_SIZE_ENV, "10");
        std::env::set_var(SW_AGENT_PROCESS_STATUS_HOOK_ENABLE_ENV, "true");
        std::env::set_var(SW_AGENT_PROCESS_LABELS_ENV, "a, b,c");

        let options = GrpcReporterOptions::from_env("http://ctor-collector:11800").unwrap();

        assert_eq!(options.collector_address, "http://env-collector:11800");
        assert_eq!(options.auth.as_deref(), Some("env-token"));
        assert_eq!(options.layer.as_deref(), Some("rust-env"));
        assert_eq!(options.check_interval, Duration::from_secs(5));
        assert_eq!(options.cds_interval, None, "a non-positive interval disables CDS polling");
        assert_eq!(options.queue_capacity, 10);
        assert!(options.process_status_hook);
        assert_eq!(options.process_labels, vec!["a".to_string(), "b".to_string(), "c".to_string()]);

        for key in [
            SW_AGENT_COLLECTOR_BACKEND_SERVICES_ENV,
            SW_AGENT_AUTHENTICATION_ENV,
            SW_AGENT_LAYER_ENV,
            SW_AGENT_COLLECTOR_HEARTBEAT_PERIOD_ENV,
            SW_AGENT_COLLECTOR_CDS_INTERVAL_ENV,
            SW_AGENT_COLLECTOR_MAX_SEND_QUEUE_SIZE_ENV,
            SW_AGENT_PROCESS_STATUS_HOOK_ENABLE_ENV,
            SW_AGENT_PROCESS_LABELS_ENV,
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn unset_env_falls_through_to_constructor_defaults() {
        for key in [
            SW_AGENT_COLLECTOR_BACKEND_SERVICES_ENV,
            SW_AGENT_AUTHENTICATION_ENV,
            SW_AGENT_LAYER_ENV,
            SW_AGENT_COLLECTOR_HEARTBEAT_PERIOD_ENV,
            SW_AGENT_COLLECTOR_CDS_INTERVAL_ENV,
            SW_AGENT_COLLECTOR_MAX_SEND_QUEUE_SIZE_ENV,
            SW_AGENT_PROCESS_STATUS_HOOK_ENABLE_ENV,
            SW_AGENT_PROCESS_LABELS_ENV,
        ] {
            std::env::remove_var(key);
        }

        let options = GrpcReporterOptions::from_env("http://ctor-collector:11800").unwrap();
        assert_eq!(options.collector_address, "http://ctor-collector:11800");
        assert!(options.auth.is_none());
        assert_eq!(options.check_interval, DEFAULT_CHECK_INTERVAL);
        assert_eq!(options.cds_interval, Some(DEFAULT_CDS_INTERVAL));
        assert_eq!(options.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn invalid_heartbeat_period_is_a_config_parse_error() {
        std::env::set_var(SW_AGENT_COLLECTOR_HEARTBEAT_PERIOD_ENV, "not-a-number");
        let result = GrpcReporterOptions::from_env("http://ctor-collector:11800");
        std::env::remove_var(SW_AGENT_COLLECTOR_HEARTBEAT_PERIOD_ENV);
        assert!(matches!(result, Err(AgentError::ConfigParse(_))));
    }
}
