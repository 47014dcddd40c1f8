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

pub mod grpc;
pub mod log;

use crate::skywalking_proto::v3::{LogData, MeterData, SegmentObject};
use tokio::sync::mpsc;

pub const DEFAULT_QUEUE_CAPACITY: usize = 30000;

/// The bounded queues producers (tracer, metric collector, logger) enqueue
/// into. Each is independent; a full queue drops its payload with a warning
/// rather than blocking the caller.
pub struct ReporterQueues {
    pub trace_tx: mpsc::Sender<SegmentObject>,
    pub meter_tx: mpsc::Sender<MeterData>,
    pub log_tx: mpsc::Sender<LogData>,
}

pub(crate) fn try_send_or_drop<Item>(tx: &mpsc::Sender<Item>, item: Item, queue: &str) {
    if let Err(err) = tx.try_send(item) {
        match err {
            mpsc::error::TrySendError::Full(_) => {
                tracing::warn!(queue, "reporter queue is full, dropping payload");
            }
            mpsc::error::TrySendError::Closed(_) => {
                tracing::warn!(queue, "reporter queue is closed, dropping payload");
            }
        }
    }
}
