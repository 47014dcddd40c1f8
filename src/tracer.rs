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

use crate::common::time::{TimeFetcher, UnixTimeStampFetcher};
use crate::context::correlation::{CorrelationContext, DEFAULT_MAX_KEYS, DEFAULT_MAX_VALUE_BYTES};
use crate::context::propagation::{CorrelationHeaderCodec, ContextDecoder, ContextEncoder};
use crate::context::trace_context::{Span, TracingContext};
use crate::error::{AgentError, Result};
use crate::sampler::Sampler;
use crate::skywalking_proto::v3::SegmentObject;
use arc_swap::ArcSwapOption;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tokio::sync::mpsc;

const SW_AGENT_NAME_ENV: &str = "SW_AGENT_NAME";
const SW_AGENT_INSTANCE_NAME_ENV: &str = "SW_AGENT_INSTANCE_NAME";
const SW_AGENT_SAMPLE_ENV: &str = "SW_AGENT_SAMPLE";

fn string_from_env(key: &str, default: impl Into<String>) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.into(),
    }
}

/// Weaves span creation, context propagation, and the sampler/reporter
/// together. Returns a `NoopSpan` from every creation method until
/// `bind_reporter` has been called, matching go2sky's "not yet initialized"
/// fallback.
pub struct Tracer<T: TimeFetcher = UnixTimeStampFetcher> {
    service: String,
    service_instance: String,
    time_fetcher: Arc<T>,
    sampler: Arc<Sampler>,
    reporter_tx: ArcSwapOption<mpsc::Sender<SegmentObject>>,
    correlation_max_keys: usize,
    correlation_max_value_bytes: usize,
}

impl<T: TimeFetcher> Tracer<T> {
    pub fn new(
        service: impl Into<String>,
        service_instance: impl Into<String>,
        time_fetcher: Arc<T>,
        sampler: Arc<Sampler>,
    ) -> Self {
        Tracer {
            service: service.into(),
            service_instance: service_instance.into(),
            time_fetcher,
            sampler,
            reporter_tx: ArcSwapOption::from(None),
            correlation_max_keys: DEFAULT_MAX_KEYS,
            correlation_max_value_bytes: DEFAULT_MAX_VALUE_BYTES,
        }
    }

    /// Overrides the correlation-context capacity policy (default `(3,
    /// 128)`) every context this tracer mints will enforce.
    pub fn with_correlation_capacity(mut self, max_keys: usize, max_value_bytes: usize) -> Self {
        self.correlation_max_keys = max_keys;
        self.correlation_max_value_bytes = max_value_bytes;
        self
    }

    /// Builds a `Tracer`, letting `SW_AGENT_NAME`, `SW_AGENT_INSTANCE_NAME`,
    /// and `SW_AGENT_SAMPLE` override the given defaults, the same
    /// precedence go2sky's `traceOptionsFormEnv` gives the environment over
    /// constructor arguments. A variable only takes effect when it is set
    /// and non-empty; a set-but-unparseable `SW_AGENT_SAMPLE` is reported as
    /// a `ConfigParse` error rather than silently falling back to the
    /// constructor's sampler.
    pub fn from_env(
        service: impl Into<String>,
        service_instance: impl Into<String>,
        time_fetcher: Arc<T>,
        default_sampler: Arc<Sampler>,
    ) -> Result<Self> {
        let service = string_from_env(SW_AGENT_NAME_ENV, service);
        let service_instance = string_from_env(SW_AGENT_INSTANCE_NAME_ENV, service_instance);

        let sampler = match std::env::var(SW_AGENT_SAMPLE_ENV) {
            Ok(value) if !value.is_empty() => {
                let rate: f64 = value.parse().map_err(|_| {
                    AgentError::ConfigParse(format!("{SW_AGENT_SAMPLE_ENV}={value:?} is not a valid sampling rate"))
                })?;
                Sampler::random(rate)
            }
            _ => default_sampler,
        };

        Ok(Self::new(service, service_instance, time_fetcher, sampler))
    }

    /// Unblocks span creation from returning `Span::Noop`. Called once the
    /// reporter has finished booting.
    pub fn bind_reporter(&self, tx: mpsc::Sender<SegmentObject>) {
        self.reporter_tx.store(Some(Arc::new(tx)));
    }

    pub fn is_booted(&self) -> bool {
        self.reporter_tx.load().is_some()
    }

    fn reporter_tx(&self) -> Option<mpsc::Sender<SegmentObject>> {
        self.reporter_tx.load().as_deref().cloned()
    }

    /// Extracts an incoming SW8 (+ SW8-correlation) header pair, if present,
    /// and creates the entry span. With no header, a new trace is started.
    pub fn create_entry_span(
        &self,
        operation_name: impl Into<String>,
        sw8_header: Option<&str>,
        sw8_correlation_header: Option<&str>,
    ) -> Result<(TracingContext<T>, Span<T>)> {
        let mut ctx = match sw8_header.filter(|h| !h.is_empty()) {
            Some(header) => {
                let propagation = ContextDecoder::new(header).decode()?;
                let correlation = sw8_correlation_header
                    .map(|h| {
                        CorrelationHeaderCodec::decode_with_capacity(
                            h,
                            self.correlation_max_keys,
                            self.correlation_max_value_bytes,
                        )
                    })
                    .unwrap_or_else(|| {
                        CorrelationContext::with_capacity(self.correlation_max_keys, self.correlation_max_value_bytes)
                    });
                TracingContext::from_propagation_context(
                    self.time_fetcher.clone(),
                    self.service.clone(),
                    self.service_instance.clone(),
                    self.reporter_tx(),
                    propagation,
                    correlation,
                )
            }
            None => {
                let mut ctx = TracingContext::new(
                    self.time_fetcher.clone(),
                    self.service.clone(),
                    self.service_instance.clone(),
                    self.reporter_tx(),
                );
                ctx.set_correlation_capacity(self.correlation_max_keys, self.correlation_max_value_bytes);
                ctx
            }
        };

        if sw8_header.is_none() && !self.sampler.is_sampled() {
            ctx.set_sampled(false);
        }

        let span = ctx.create_entry_span(operation_name)?;
        Ok((ctx, span))
    }

    pub fn create_local_span(&self, ctx: &mut TracingContext<T>, operation_name: impl Into<String>) -> Result<Span<T>> {
        ctx.create_local_span(operation_name)
    }

    /// Creates an exit span and returns the SW8 / SW8-correlation header
    /// values the caller must attach to its outgoing request.
    pub fn create_exit_span(
        &self,
        ctx: &mut TracingContext<T>,
        operation_name: impl Into<String>,
        remote_peer: impl Into<String>,
    ) -> Result<(Span<T>, String, String)> {
        let mut sw8_header = String::new();
        let mut correlation_header = String::new();

        let span = ctx.create_exit_span(operation_name, remote_peer, |key, value| match key {
            "sw8" => sw8_header = value.to_string(),
            "sw8-correlation" => correlation_header = value.to_string(),
            _ => {}
        })?;

        Ok((span, sw8_header, correlation_header))
    }

    pub fn correlation_context(ctx: &TracingContext<T>) -> &CorrelationContext {
        &ctx.correlation
    }
}

static GLOBAL_TRACER: Lazy<ArcSwapOption<Tracer<UnixTimeStampFetcher>>> = Lazy::new(|| ArcSwapOption::from(None));

/// Process-global convenience handle; last writer wins.
pub fn set_global_tracer(tracer: Arc<Tracer<UnixTimeStampFetcher>>) {
    GLOBAL_TRACER.store(Some(tracer));
}

pub fn global_tracer() -> Option<Arc<Tracer<UnixTimeStampFetcher>>> {
    GLOBAL_TRACER.load_full()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entry_span_is_noop_before_reporter_boots() {
        let tracer = Tracer::new(
            "service",
            "instance",
            Arc::new(UnixTimeStampFetcher),
            Sampler::constant(true),
        );
        let (_, span) = tracer.create_entry_span("op", None, None).unwrap();
        assert_eq!(span.span_id(), -1);
    }

    #[tokio::test]
    async fn entry_span_reports_once_bound() {
        let tracer = Tracer::new(
            "service",
            "instance",
            Arc::new(UnixTimeStampFetcher),
            Sampler::constant(true),
        );
        let (tx, _rx) = mpsc::channel(8);
        tracer.bind_reporter(tx);
        assert!(tracer.is_booted());

        let (_, span) = tracer.create_entry_span("op", None, None).unwrap();
        assert_eq!(span.span_id(), 0);
    }

    #[tokio::test]
    async fn global_tracer_round_trips() {
        let tracer = Arc::new(Tracer::new(
            "service",
            "instance",
            Arc::new(UnixTimeStampFetcher),
            Sampler::constant(true),
        ));
        set_global_tracer(tracer.clone());
        assert!(global_tracer().is_some());
    }

    // Exercises every SW_AGENT_* var this module reads in one test, setting
    // and clearing them sequentially, so no other test racing on the same
    // process-wide env can observe a half-set state.
    #[test]
    fn env_overrides_win_over_constructor_defaults() {
        std::env::set_var(SW_AGENT_NAME_ENV, "env-service");
        std::env::set_var(SW_AGENT_INSTANCE_NAME_ENV, "env-instance");
        std::env::set_var(SW_AGENT_SAMPLE_ENV, "1.0");

        let tracer = Tracer::from_env(
            "ctor-service",
            "ctor-instance",
            Arc::new(UnixTimeStampFetcher),
            Sampler::constant(false),
        )
        .unwrap();
        assert_eq!(tracer.service, "env-service");
        assert_eq!(tracer.service_instance, "env-instance");
        assert!(tracer.sampler.is_sampled());

        std::env::remove_var(SW_AGENT_NAME_ENV);
        std::env::remove_var(SW_AGENT_INSTANCE_NAME_ENV);
        std::env::remove_var(SW_AGENT_SAMPLE_ENV);
    }

    #[test]
    fn unset_env_falls_through_to_constructor_defaults() {
        std::env::remove_var(SW_AGENT_NAME_ENV);
        std::env::remove_var(SW_AGENT_INSTANCE_NAME_ENV);
        std::env::remove_var(SW_AGENT_SAMPLE_ENV);

        let tracer = Tracer::from_env(
            "ctor-service",
            "ctor-instance",
            Arc::new(UnixTimeStampFetcher),
            Sampler::constant(true),
        )
        .unwrap();
        assert_eq!(tracer.service, "ctor-service");
        assert_eq!(tracer.service_instance, "ctor-instance");
        assert!(tracer.sampler.is_sampled());
    }

    #[test]
    fn invalid_sample_rate_is_a_config_parse_error() {
        std::env::set_var(SW_AGENT_SAMPLE_ENV, "not-a-float");
        let result = Tracer::from_env(
            "ctor-service",
            "ctor-instance",
            Arc::new(UnixTimeStampFetcher),
            Sampler::constant(true),
        );
        std::env::remove_var(SW_AGENT_SAMPLE_ENV);
        assert!(matches!(result, Err(AgentError::ConfigParse(_))));
    }

    #[tokio::test]
    async fn configured_correlation_capacity_is_enforced_on_new_traces() {
        let tracer = Tracer::new(
            "service",
            "instance",
            Arc::new(UnixTimeStampFetcher),
            Sampler::constant(true),
        )
        .with_correlation_capacity(1, 4);
        let (mut ctx, _span) = tracer.create_entry_span("op", None, None).unwrap();

        assert!(ctx.correlation.put("k1", "ok"));
        // A second key is refused: the tracer's configured max of one key
        // applies, not CorrelationContext::new's default of three.
        assert!(!ctx.correlation.put("k2", "ok"));
        // A value of five bytes exceeds the configured four-byte limit.
        assert!(!ctx.correlation.put("k3", "12345"));
    }

    #[tokio::test]
    async fn configured_correlation_capacity_is_enforced_when_continuing_a_trace() {
        let tracer = Tracer::new(
            "service",
            "instance",
            Arc::new(UnixTimeStampFetcher),
            Sampler::constant(true),
        )
        .with_correlation_capacity(1, 128);

        let header = ContextEncoder::encode(&crate::context::propagation::PropagationContext::new(
            true,
            "trace-id".to_string(),
            "segment-id".to_string(),
            0,
            "upstream".to_string(),
            "upstream-instance".to_string(),
            "/endpoint".to_string(),
            "127.0.0.1:1234".to_string(),
        ));
        let mut upstream_correlation = CorrelationContext::new();
        upstream_correlation.put("a", "b");
        let correlation_header = CorrelationHeaderCodec::encode(&upstream_correlation);

        let (mut ctx, _span) = tracer
            .create_entry_span("op", Some(&header), Some(&correlation_header))
            .unwrap();

        assert_eq!(ctx.correlation.get("a"), "b");
        assert!(!ctx.correlation.put("second-key", "ok"));
    }
}
