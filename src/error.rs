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

use thiserror::Error;

/// Failures decoding an SW8 or SW8-correlation propagation header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderParseError {
    #[error("propagation header is empty")]
    EmptyHeader,
    #[error("propagation header must have 8 properties, found {0}")]
    InsufficientEntities(usize),
    #[error("failed to parse sample status")]
    InvalidSampleStatus,
    #[error("failed to parse parent span id")]
    InvalidParentSpanId,
    #[error("failed to decode base64 field")]
    InvalidBase64,
    #[error("decoded field is not valid utf-8")]
    InvalidUtf8,
}

impl From<base64::DecodeError> for HeaderParseError {
    fn from(_: base64::DecodeError) -> Self {
        HeaderParseError::InvalidBase64
    }
}

/// Top-level error taxonomy for the agent. Tracing itself never propagates
/// these into application hot paths: the worst visible outcome of a failure
/// is a `NoopSpan` or a silently dropped payload.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("failed to parse propagation header: {0}")]
    HeaderParse(#[from] HeaderParseError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("reporter queue is full, payload dropped")]
    Backpressure,

    #[error("internal task failure: {0}")]
    Internal(String),

    #[error("invalid configuration: {0}")]
    ConfigParse(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
