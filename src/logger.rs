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

use crate::context::trace_context::TracingContext;
use crate::common::time::TimeFetcher;
use crate::reporter::try_send_or_drop;
use crate::skywalking_proto::v3::{
    KeyStringValuePair, LogData, LogDataBody, LogTags, TextLog, TraceContext as ProtoTraceContext,
};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Accepts application log records, attaches trace identifiers, and
/// enqueues them into the reporter's log pipeline.
pub struct Logger {
    service: String,
    service_instance: String,
    log_tx: mpsc::Sender<LogData>,
}

impl Logger {
    pub fn new(service: impl Into<String>, service_instance: impl Into<String>, log_tx: mpsc::Sender<LogData>) -> Self {
        Logger {
            service: service.into(),
            service_instance: service_instance.into(),
            log_tx,
        }
    }

    /// `active` carries the context and span id of the span the caller is
    /// currently inside, if any. Absent, the trace context is reported as
    /// empty strings and span id `-1`.
    pub fn write<T: TimeFetcher>(
        &self,
        active: Option<(&TracingContext<T>, i32)>,
        level: LogLevel,
        data: impl Into<String>,
        timestamp: i64,
    ) {
        let trace_context = match active {
            Some((ctx, span_id)) => ProtoTraceContext {
                trace_id: ctx.trace_id.clone(),
                trace_segment_id: ctx.trace_segment_id.clone(),
                span_id,
            },
            None => ProtoTraceContext {
                trace_id: String::new(),
                trace_segment_id: String::new(),
                span_id: -1,
            },
        };

        let log = LogData {
            timestamp,
            service: self.service.clone(),
            service_instance: self.service_instance.clone(),
            endpoint: String::new(),
            trace_context: Some(trace_context),
            body: Some(LogDataBody {
                r#type: "text".to_string(),
                text: Some(TextLog { text: data.into() }),
            }),
            tags: Some(LogTags {
                data: vec![KeyStringValuePair {
                    key: "LEVEL".to_string(),
                    value: level.as_str().to_string(),
                }],
            }),
        };

        try_send_or_drop(&self.log_tx, log, "log");
    }
}
