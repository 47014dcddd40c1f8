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

use skywalking_rs_agent::common::time::UnixTimeStampFetcher;
use skywalking_rs_agent::reporter::log::StderrReporter;
use skywalking_rs_agent::sampler::Sampler;
use skywalking_rs_agent::tracer::Tracer;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let tracer = Tracer::new(
        "service",
        "instance",
        Arc::new(UnixTimeStampFetcher),
        Sampler::constant(true),
    );
    tracer.bind_reporter(StderrReporter::start());

    let (_ctx, span) = tracer.create_entry_span("op1", None, None).unwrap();
    span.end();

    // give the segment collector a moment to assemble and print the segment
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
}
