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

//! In-process distributed tracing agent implementing the SkyWalking SW8
//! wire protocol: span creation and segment assembly, cross-process context
//! propagation, correlation baggage, sampling with live reconfiguration,
//! and a gRPC reporter pipeline for traces, meters, and logs.
//!
//! This crate never installs its own `tracing` subscriber; host
//! applications wire one up themselves.

pub mod common;
pub mod config_discovery;
pub mod context;
pub mod error;
pub mod logger;
pub mod metrics;
pub mod reporter;
pub mod sampler;
pub mod tracer;

pub mod skywalking_proto {
    pub mod v3 {
        tonic::include_proto!("skywalking.v3");
    }
}

pub use error::{AgentError, Result};
