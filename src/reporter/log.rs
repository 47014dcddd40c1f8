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

//! A minimal stderr reporter, mirroring go2sky's `reporter.NewLogReporter()`
//! dev helper: it prints every reported segment instead of shipping it to a
//! collector. Used by the crate's own demo and for quick local debugging,
//! not intended for production use.

use crate::skywalking_proto::v3::SegmentObject;
use tokio::sync::mpsc;

pub struct StderrReporter;

impl StderrReporter {
    pub fn start() -> mpsc::Sender<SegmentObject> {
        let (tx, mut rx) = mpsc::channel::<SegmentObject>(1024);
        tokio::spawn(async move {
            while let Some(segment) = rx.recv().await {
                eprintln!("{:?}", segment);
            }
        });
        tx
    }
}
