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

use crate::common::random_generator::RandomGenerator;
use crate::common::time::TimeFetcher;
use crate::context::correlation::CorrelationContext;
use crate::context::propagation::PropagationContext;
use crate::error::{AgentError, Result};
use crate::metrics::LIVE_SEGMENT_COLLECTORS;
use crate::skywalking_proto::v3::{
    KeyStringValuePair, Log, RefType, SegmentObject, SegmentReference, SpanLayer, SpanObject, SpanType,
};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tracing::warn;

/// Shared state backing one segment. Every span belonging to the segment
/// holds an `Arc` to this; joining and closing are lock-free.
struct SegmentInner {
    span_id_generator: AtomicI32,
    // Counts non-root spans that have joined the segment. A negative value
    // is the "closed" sentinel: the root has ended and no further span may
    // join.
    ref_count: AtomicI32,
    spans_tx: mpsc::UnboundedSender<SpanObject>,
    done_tx: AsyncMutex<Option<oneshot::Sender<(i32, SpanObject)>>>,
}

impl SegmentInner {
    fn next_span_id(&self) -> i32 {
        self.span_id_generator.fetch_add(1, Ordering::SeqCst)
    }

    /// Attempts to attach a non-root span to the segment via a CAS loop.
    /// Fails once the segment has been closed by its root.
    fn try_join(&self) -> bool {
        loop {
            let current = self.ref_count.load(Ordering::SeqCst);
            if current < 0 {
                return false;
            }
            if self
                .ref_count
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return true;
            }
        }
    }

    fn close_root(&self) -> i32 {
        self.ref_count.swap(-1, Ordering::SeqCst)
    }
}

/// Drains span arrivals and the root's completion signal, then submits the
/// assembled segment to the reporter exactly once, root last. Terminates
/// once the number of buffered spans reaches the ref count the root
/// observed when it closed.
async fn run_collector(
    mut spans_rx: mpsc::UnboundedReceiver<SpanObject>,
    mut done_rx: oneshot::Receiver<(i32, SpanObject)>,
    reporter_tx: mpsc::Sender<SegmentObject>,
    trace_id: String,
    trace_segment_id: String,
    service: String,
    service_instance: String,
) {
    LIVE_SEGMENT_COLLECTORS.fetch_add(1, Ordering::Relaxed);

    let mut buffer = Vec::new();
    let mut root: Option<SpanObject> = None;
    let mut total: Option<i32> = None;

    loop {
        if let Some(total) = total {
            if buffer.len() as i32 >= total {
                break;
            }
        }
        tokio::select! {
            maybe_span = spans_rx.recv() => {
                match maybe_span {
                    Some(span) => buffer.push(span),
                    None => break,
                }
            }
            res = &mut done_rx, if root.is_none() => {
                match res {
                    Ok((final_ref_count, root_span)) => {
                        total = Some(final_ref_count);
                        root = Some(root_span);
                    }
                    Err(_) => break,
                }
            }
        }
    }

    if let Some(root_span) = root {
        buffer.push(root_span);
    }

    let segment = SegmentObject {
        trace_id,
        trace_segment_id,
        spans: buffer,
        service,
        service_instance,
        is_size_limited: false,
    };

    if reporter_tx.try_send(segment).is_err() {
        warn!("trace reporter queue full or closed, segment dropped");
    }

    LIVE_SEGMENT_COLLECTORS.fetch_sub(1, Ordering::Relaxed);
}

/// One span's mutable state. Shared behavior across entry/exit/local spans;
/// the wrapping `Span` enum is what tells them apart.
pub struct SpanRecord<T: TimeFetcher> {
    pub span_internal: SpanObject,
    time_fetcher: Arc<T>,
    segment: Arc<SegmentInner>,
    is_root: bool,
    ended: bool,
}

impl<T: TimeFetcher> SpanRecord<T> {
    #[allow(clippy::too_many_arguments)]
    fn new(
        span_id: i32,
        parent_span_id: i32,
        operation_name: String,
        remote_peer: String,
        span_type: SpanType,
        span_layer: SpanLayer,
        skip_analysis: bool,
        time_fetcher: Arc<T>,
        segment: Arc<SegmentInner>,
        is_root: bool,
    ) -> Self {
        let span_internal = SpanObject {
            span_id,
            parent_span_id,
            start_time: time_fetcher.get(),
            end_time: 0,
            refs: Vec::new(),
            operation_name,
            peer: remote_peer,
            span_type: span_type as i32,
            span_layer: span_layer as i32,
            // TODO(shikugawa): map to the component id table in
            // https://github.com/apache/skywalking/blob/master/oap-server/server-starter/src/main/resources/component-libraries.yml
            component_id: 11000,
            is_error: false,
            tags: Vec::new(),
            logs: Vec::new(),
            skip_analysis,
        };

        SpanRecord {
            span_internal,
            time_fetcher,
            segment,
            is_root,
            ended: false,
        }
    }

    pub fn set_operation_name(&mut self, name: String) {
        if self.ended {
            return;
        }
        self.span_internal.operation_name = name;
    }

    pub fn set_peer(&mut self, peer: String) {
        if self.ended {
            return;
        }
        self.span_internal.peer = peer;
    }

    pub fn set_span_layer(&mut self, layer: SpanLayer) {
        if self.ended {
            return;
        }
        self.span_internal.span_layer = layer as i32;
    }

    pub fn set_component(&mut self, component_id: i32) {
        if self.ended {
            return;
        }
        self.span_internal.component_id = component_id;
    }

    pub fn tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if self.ended {
            return;
        }
        self.span_internal.tags.push(KeyStringValuePair {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Odd trailing key without a matching value is dropped.
    pub fn log(&mut self, time: i64, fields: Vec<(String, String)>) {
        if self.ended {
            return;
        }
        let data = fields
            .into_iter()
            .map(|(key, value)| KeyStringValuePair { key, value })
            .collect();
        self.span_internal.logs.push(Log { time, data });
    }

    pub fn error(&mut self, time: i64, fields: Vec<(String, String)>) {
        if self.ended {
            return;
        }
        self.span_internal.is_error = true;
        self.log(time, fields);
    }

    fn add_reference(&mut self, reference: SegmentReference) {
        self.span_internal.refs.push(reference);
    }

    pub fn is_valid(&self) -> bool {
        !self.ended
    }

    /// Ends the span and hands it to the segment's collector task. The
    /// handoff runs on a detached task so `end` never blocks its caller.
    fn end(mut self) {
        if self.ended {
            return;
        }
        self.span_internal.end_time = self.time_fetcher.get();
        self.ended = true;

        if self.is_root {
            let final_ref_count = self.segment.close_root();
            let segment = self.segment.clone();
            let span = self.span_internal.clone();
            tokio::spawn(async move {
                if let Some(done_tx) = segment.done_tx.lock().await.take() {
                    let _ = done_tx.send((final_ref_count, span));
                }
            });
        } else {
            let segment = self.segment.clone();
            let span = self.span_internal.clone();
            tokio::spawn(async move {
                let _ = segment.spans_tx.send(span);
            });
        }
    }
}

/// A span in one of its three reportable forms, or a no-op returned while
/// the reporter has not finished booting.
pub enum Span<T: TimeFetcher> {
    Entry(SpanRecord<T>),
    Exit(SpanRecord<T>),
    Local(SpanRecord<T>),
    Noop,
}

impl<T: TimeFetcher> Span<T> {
    pub fn set_operation_name(&mut self, name: String) {
        match self {
            Span::Entry(s) | Span::Exit(s) | Span::Local(s) => s.set_operation_name(name),
            Span::Noop => {}
        }
    }

    pub fn set_peer(&mut self, peer: String) {
        match self {
            Span::Entry(s) | Span::Exit(s) | Span::Local(s) => s.set_peer(peer),
            Span::Noop => {}
        }
    }

    pub fn set_span_layer(&mut self, layer: SpanLayer) {
        match self {
            Span::Entry(s) | Span::Exit(s) | Span::Local(s) => s.set_span_layer(layer),
            Span::Noop => {}
        }
    }

    pub fn set_component(&mut self, component_id: i32) {
        match self {
            Span::Entry(s) | Span::Exit(s) | Span::Local(s) => s.set_component(component_id),
            Span::Noop => {}
        }
    }

    pub fn tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        match self {
            Span::Entry(s) | Span::Exit(s) | Span::Local(s) => s.tag(key, value),
            Span::Noop => {}
        }
    }

    pub fn log(&mut self, time: i64, fields: Vec<(String, String)>) {
        match self {
            Span::Entry(s) | Span::Exit(s) | Span::Local(s) => s.log(time, fields),
            Span::Noop => {}
        }
    }

    pub fn error(&mut self, time: i64, fields: Vec<(String, String)>) {
        match self {
            Span::Entry(s) | Span::Exit(s) | Span::Local(s) => s.error(time, fields),
            Span::Noop => {}
        }
    }

    pub fn span_id(&self) -> i32 {
        match self {
            Span::Entry(s) | Span::Exit(s) | Span::Local(s) => s.span_internal.span_id,
            Span::Noop => -1,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Span::Entry(s) | Span::Exit(s) | Span::Local(s) => s.is_valid(),
            Span::Noop => true,
        }
    }

    pub fn end(self) {
        match self {
            Span::Entry(s) | Span::Exit(s) | Span::Local(s) => s.end(),
            Span::Noop => {}
        }
    }
}

/// The explicit, `Clone`-able handle applications thread through their own
/// call graph in place of a scoped/thread-local context. Cloning shares the
/// same underlying segment, letting concurrently-spawned tasks join it.
pub struct TracingContext<T: TimeFetcher> {
    pub trace_id: String,
    pub trace_segment_id: String,
    pub service: String,
    pub service_instance: String,
    pub correlation: CorrelationContext,
    sample: bool,
    entry_endpoint: String,
    entry_span_created: bool,
    // The most recently created span in this context's lineage; becomes the
    // `parent_span_id` of the next span created from this handle. Cloning a
    // context snapshots this value, so two clones created from the same
    // parent each root their own branch at that parent rather than chaining
    // off one another.
    active_span_id: i32,
    time_fetcher: Arc<T>,
    reporter_tx: Option<mpsc::Sender<SegmentObject>>,
    segment: Option<Arc<SegmentInner>>,
    parent_reference: Option<SegmentReference>,
}

impl<T: TimeFetcher> Clone for TracingContext<T> {
    fn clone(&self) -> Self {
        TracingContext {
            trace_id: self.trace_id.clone(),
            trace_segment_id: self.trace_segment_id.clone(),
            service: self.service.clone(),
            service_instance: self.service_instance.clone(),
            correlation: self.correlation.clone(),
            sample: self.sample,
            entry_endpoint: self.entry_endpoint.clone(),
            entry_span_created: self.entry_span_created,
            active_span_id: self.active_span_id,
            time_fetcher: self.time_fetcher.clone(),
            reporter_tx: self.reporter_tx.clone(),
            segment: self.segment.clone(),
            parent_reference: self.parent_reference.clone(),
        }
    }
}

impl<T: TimeFetcher> TracingContext<T> {
    /// Starts a new trace: no in-process or cross-process parent exists.
    pub fn new(
        time_fetcher: Arc<T>,
        service_name: impl Into<String>,
        instance_name: impl Into<String>,
        reporter_tx: Option<mpsc::Sender<SegmentObject>>,
    ) -> Self {
        TracingContext {
            trace_id: RandomGenerator::generate_hex(),
            trace_segment_id: RandomGenerator::generate_hex(),
            service: service_name.into(),
            service_instance: instance_name.into(),
            correlation: CorrelationContext::new(),
            sample: true,
            entry_endpoint: String::new(),
            entry_span_created: false,
            active_span_id: -1,
            time_fetcher,
            reporter_tx,
            segment: None,
            parent_reference: None,
        }
    }

    /// Continues a trace whose cross-process parent was decoded from an
    /// incoming SW8 (and SW8-correlation) header.
    pub fn from_propagation_context(
        time_fetcher: Arc<T>,
        service_name: impl Into<String>,
        instance_name: impl Into<String>,
        reporter_tx: Option<mpsc::Sender<SegmentObject>>,
        context: PropagationContext,
        correlation: CorrelationContext,
    ) -> Self {
        let parent_reference = SegmentReference {
            ref_type: RefType::CrossProcess as i32,
            trace_id: context.parent_trace_id.clone(),
            parent_trace_segment_id: context.parent_trace_segment_id.clone(),
            parent_span_id: context.parent_span_id,
            parent_service: context.parent_service.clone(),
            parent_service_instance: context.parent_service_instance.clone(),
            parent_endpoint: context.destination_endpoint.clone(),
            network_address_used_at_peer: context.destination_address.clone(),
        };

        TracingContext {
            trace_id: context.parent_trace_id,
            trace_segment_id: RandomGenerator::generate_hex(),
            service: service_name.into(),
            service_instance: instance_name.into(),
            correlation,
            sample: context.do_sample,
            entry_endpoint: context.destination_endpoint,
            entry_span_created: false,
            active_span_id: -1,
            time_fetcher,
            reporter_tx,
            segment: None,
            parent_reference: Some(parent_reference),
        }
    }

    pub fn is_sampled(&self) -> bool {
        self.sample
    }

    pub fn set_sampled(&mut self, sampled: bool) {
        self.sample = sampled;
    }

    /// Rebuilds the correlation store under a different capacity policy.
    /// Used by the tracer to apply a configured `(max_keys, max_value_bytes)`
    /// in place of `CorrelationContext::new`'s defaults; callers apply this
    /// before any `put` so no entries are lost.
    pub fn set_correlation_capacity(&mut self, max_keys: usize, max_value_bytes: usize) {
        self.correlation = CorrelationContext::with_capacity(max_keys, max_value_bytes);
    }

    fn ensure_segment(&mut self) -> Option<Arc<SegmentInner>> {
        if let Some(segment) = &self.segment {
            return Some(segment.clone());
        }
        let reporter_tx = self.reporter_tx.clone()?;

        let (spans_tx, spans_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();
        let segment = Arc::new(SegmentInner {
            span_id_generator: AtomicI32::new(0),
            ref_count: AtomicI32::new(0),
            spans_tx,
            done_tx: AsyncMutex::new(Some(done_tx)),
        });

        tokio::spawn(run_collector(
            spans_rx,
            done_rx,
            reporter_tx,
            self.trace_id.clone(),
            self.trace_segment_id.clone(),
            self.service.clone(),
            self.service_instance.clone(),
        ));

        self.segment = Some(segment.clone());
        Some(segment)
    }

    fn new_span(
        &mut self,
        operation_name: String,
        remote_peer: String,
        span_type: SpanType,
        span_layer: SpanLayer,
    ) -> Result<Span<T>> {
        if operation_name.is_empty() {
            return Err(AgentError::InvalidArgument("operation name must not be empty"));
        }

        let mut segment = match self.ensure_segment() {
            Some(segment) => segment,
            None => return Ok(Span::Noop),
        };

        let mut span_id = segment.next_span_id();
        let mut is_root = span_id == 0;
        if !is_root && !segment.try_join() {
            // The root already closed this segment: start a new one instead
            // of failing, with the new root carrying a CrossThread reference
            // back to the span it branched from.
            let cross_thread_ref = SegmentReference {
                ref_type: RefType::CrossThread as i32,
                trace_id: self.trace_id.clone(),
                parent_trace_segment_id: self.trace_segment_id.clone(),
                parent_span_id: self.active_span_id,
                parent_service: self.service.clone(),
                parent_service_instance: self.service_instance.clone(),
                parent_endpoint: self.entry_endpoint.clone(),
                network_address_used_at_peer: String::new(),
            };
            self.trace_segment_id = RandomGenerator::generate_hex();
            self.segment = None;
            self.parent_reference = Some(cross_thread_ref);

            segment = self
                .ensure_segment()
                .expect("reporter_tx is present: the first ensure_segment call above already succeeded");
            span_id = segment.next_span_id();
            is_root = span_id == 0;
        }

        let parent_span_id = if is_root { -1 } else { self.active_span_id };
        let mut record = SpanRecord::new(
            span_id,
            parent_span_id,
            operation_name.clone(),
            remote_peer,
            span_type,
            span_layer,
            false,
            self.time_fetcher.clone(),
            segment,
            is_root,
        );

        if is_root {
            if let Some(reference) = self.parent_reference.take() {
                record.add_reference(reference);
            }
            if matches!(span_type, SpanType::Entry) {
                self.entry_endpoint = operation_name;
            }
        }

        self.active_span_id = span_id;

        Ok(match span_type {
            SpanType::Entry => Span::Entry(record),
            SpanType::Exit => Span::Exit(record),
            SpanType::Local => Span::Local(record),
        })
    }

    /// Creates the entry span for this context. At most one entry span may
    /// be created per context.
    pub fn create_entry_span(&mut self, operation_name: impl Into<String>) -> Result<Span<T>> {
        if self.entry_span_created {
            return Err(AgentError::InvalidArgument(
                "failed to create entry span: an entry span already exists for this context",
            ));
        }
        let span = self.new_span(operation_name.into(), String::new(), SpanType::Entry, SpanLayer::Http)?;
        self.entry_span_created = true;
        Ok(span)
    }

    pub fn create_local_span(&mut self, operation_name: impl Into<String>) -> Result<Span<T>> {
        self.new_span(operation_name.into(), String::new(), SpanType::Local, SpanLayer::Unknown)
    }

    /// Creates an exit span and, via `inject`, writes the outgoing SW8 and
    /// SW8-correlation header values the caller should attach to its
    /// downstream request. `inject` is always called for both headers.
    pub fn create_exit_span(
        &mut self,
        operation_name: impl Into<String>,
        remote_peer: impl Into<String>,
        mut inject: impl FnMut(&str, &str),
    ) -> Result<Span<T>> {
        let operation_name = operation_name.into();
        let remote_peer = remote_peer.into();
        if remote_peer.is_empty() {
            return Err(AgentError::InvalidArgument("exit span requires a non-empty peer"));
        }

        let span = self.new_span(
            operation_name,
            remote_peer.clone(),
            SpanType::Exit,
            SpanLayer::Http,
        )?;

        let header = PropagationContext::new(
            self.sample,
            self.trace_id.clone(),
            self.trace_segment_id.clone(),
            span.span_id(),
            self.service.clone(),
            self.service_instance.clone(),
            self.entry_endpoint.clone(),
            remote_peer,
        );

        inject(
            "sw8",
            &crate::context::propagation::ContextEncoder::encode(&header),
        );
        inject(
            "sw8-correlation",
            &crate::context::propagation::CorrelationHeaderCodec::encode(&self.correlation),
        );

        Ok(span)
    }

    /// Converts this context's ids into the wire-level segment envelope.
    /// Used by reference implementations and tests that bypass the
    /// aggregator; the gRPC reporter itself receives already-assembled
    /// segments from the collector task.
    pub fn convert_segment_object(&self, spans: Vec<SpanObject>) -> SegmentObject {
        SegmentObject {
            trace_id: self.trace_id.clone(),
            trace_segment_id: self.trace_segment_id.clone(),
            spans,
            service: self.service.clone(),
            service_instance: self.service_instance.clone(),
            is_size_limited: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::time::UnixTimeStampFetcher;
    use std::time::Duration;

    #[tokio::test]
    async fn create_span() {
        let mut ctx = TracingContext::new(Arc::new(UnixTimeStampFetcher), "service", "instance", None);
        let mut span = ctx.create_entry_span("op1").unwrap();
        assert!(span.is_valid());
        span.tag("http.method", "GET");
        span.end();
    }

    #[tokio::test]
    async fn create_span_from_context() {
        let parent = PropagationContext::new(
            true,
            RandomGenerator::generate_hex(),
            RandomGenerator::generate_hex(),
            0,
            "upstream".to_string(),
            "upstream-instance".to_string(),
            "/endpoint".to_string(),
            "127.0.0.1:1234".to_string(),
        );
        let mut ctx = TracingContext::new_from_propagation_for_test(parent);
        let span = ctx.create_entry_span("op1").unwrap();
        assert!(span.is_valid());
    }

    impl TracingContext<UnixTimeStampFetcher> {
        fn new_from_propagation_for_test(parent: PropagationContext) -> Self {
            TracingContext::from_propagation_context(
                Arc::new(UnixTimeStampFetcher),
                "service",
                "instance",
                None,
                parent,
                CorrelationContext::new(),
            )
        }
    }

    #[tokio::test]
    async fn segment_reports_exactly_once_with_root_last() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut ctx = TracingContext::new(Arc::new(UnixTimeStampFetcher), "service", "instance", Some(tx));

        let entry = ctx.create_entry_span("entry").unwrap();
        let mut child_ctx = ctx.clone();
        let child = child_ctx.create_local_span("child").unwrap();

        child.end();
        entry.end();

        let segment = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("collector should report the segment")
            .expect("channel should not be closed");

        assert_eq!(segment.spans.len(), 2);
        assert_eq!(segment.spans.last().unwrap().span_id, 0, "root must be reported last");
    }

    #[tokio::test]
    async fn join_after_root_closed_reroots_with_cross_thread_ref() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut ctx = TracingContext::new(Arc::new(UnixTimeStampFetcher), "service", "instance", Some(tx));
        let entry = ctx.create_entry_span("entry").unwrap();
        let first_segment_id = ctx.trace_segment_id.clone();
        entry.end();

        let first_segment = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("collector should report the first segment")
            .expect("channel should not be closed");
        assert_eq!(first_segment.trace_segment_id, first_segment_id);

        // The root already closed the segment; this must re-root a new one
        // rather than erroring out.
        let span = ctx.create_local_span("too-late").unwrap();
        assert_eq!(span.span_id(), 0, "re-rooted span starts a fresh segment at id 0");
        assert_ne!(
            ctx.trace_segment_id, first_segment_id,
            "re-rooting must mint a new segment id"
        );
        assert_eq!(ctx.trace_id, first_segment.trace_id, "re-rooted segment stays on the same trace");
        span.end();

        let second_segment = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("collector should report the re-rooted segment")
            .expect("channel should not be closed");

        assert_eq!(second_segment.trace_segment_id, ctx.trace_segment_id);
        assert_eq!(second_segment.spans.len(), 1);
        let root = &second_segment.spans[0];
        assert_eq!(root.refs.len(), 1, "re-rooted span must carry a CrossThread ref");
        let reference = &root.refs[0];
        assert_eq!(reference.ref_type, RefType::CrossThread as i32);
        assert_eq!(reference.parent_trace_segment_id, first_segment_id);
        assert_eq!(reference.parent_span_id, 0, "branched from the entry span, which was span 0");
    }

    #[tokio::test]
    async fn entry_span_can_only_be_created_once() {
        let mut ctx = TracingContext::new(Arc::new(UnixTimeStampFetcher), "service", "instance", None);
        ctx.create_entry_span("entry").unwrap();
        let err = ctx.create_entry_span("entry-again").unwrap_err();
        assert!(matches!(err, AgentError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn sibling_spans_both_link_to_the_same_parent() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut ctx = TracingContext::new(Arc::new(UnixTimeStampFetcher), "service", "instance", Some(tx));

        let entry = ctx.create_entry_span("entry").unwrap();
        // Two children cloned from the same point in the lineage are
        // siblings: both must carry the root as their parent, not chain off
        // each other via span-id arithmetic.
        let mut sibling_a_ctx = ctx.clone();
        let mut sibling_b_ctx = ctx.clone();
        let sibling_a = sibling_a_ctx.create_local_span("a").unwrap();
        let sibling_b = sibling_b_ctx.create_local_span("b").unwrap();

        let (a_id, a_parent) = (sibling_a.span_id(), 0);
        let (b_id, b_parent) = (sibling_b.span_id(), 0);
        assert_ne!(a_id, b_id);

        sibling_a.end();
        sibling_b.end();
        entry.end();

        let segment = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("collector should report the segment")
            .expect("channel should not be closed");

        assert_eq!(segment.spans.len(), 3);
        for span in &segment.spans {
            if span.span_id == a_id {
                assert_eq!(span.parent_span_id, a_parent);
            }
            if span.span_id == b_id {
                assert_eq!(span.parent_span_id, b_parent);
            }
        }
    }

    #[tokio::test]
    async fn without_reporter_spans_are_noop() {
        let mut ctx = TracingContext::new(Arc::new(UnixTimeStampFetcher), "service", "instance", None);
        let span = ctx.create_entry_span("entry").unwrap();
        assert_eq!(span.span_id(), -1);
    }
}
