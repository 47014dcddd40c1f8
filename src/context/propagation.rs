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

//! Codec for the SW8 trace header and the SW8-correlation header. Pure
//! encode/decode; the capacity policy for correlation entries lives in
//! `crate::context::correlation`.

use crate::context::correlation::{CorrelationContext, DEFAULT_MAX_KEYS, DEFAULT_MAX_VALUE_BYTES};
use crate::error::HeaderParseError;
use base64::{decode, encode};

pub const SW8_HEADER_FIELD_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationContext {
    /// Whether the downstream span should be sampled.
    pub do_sample: bool,
    pub parent_trace_id: String,
    pub parent_trace_segment_id: String,
    pub parent_span_id: i32,
    pub parent_service: String,
    pub parent_service_instance: String,
    pub destination_endpoint: String,
    pub destination_address: String,
}

impl PropagationContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        do_sample: bool,
        parent_trace_id: String,
        parent_trace_segment_id: String,
        parent_span_id: i32,
        parent_service: String,
        parent_service_instance: String,
        destination_endpoint: String,
        destination_address: String,
    ) -> Self {
        PropagationContext {
            do_sample,
            parent_trace_id,
            parent_trace_segment_id,
            parent_span_id,
            parent_service,
            parent_service_instance,
            destination_endpoint,
            destination_address,
        }
    }
}

pub struct ContextDecoder<'a> {
    header_value: &'a str,
}

impl<'a> ContextDecoder<'a> {
    pub fn new(header_value: &'a str) -> Self {
        ContextDecoder { header_value }
    }

    /// Decodes an SW8 trace header. Total: on any error, no partial mutation
    /// is visible (the caller simply never receives a `PropagationContext`).
    pub fn decode(&self) -> Result<PropagationContext, HeaderParseError> {
        if self.header_value.is_empty() {
            return Err(HeaderParseError::EmptyHeader);
        }

        let pieces: Vec<&str> = self.header_value.split('-').collect();
        if pieces.len() != SW8_HEADER_FIELD_COUNT {
            return Err(HeaderParseError::InsufficientEntities(pieces.len()));
        }

        let do_sample = Self::parse_sample_status(pieces[0])?;
        let parent_trace_id = Self::b64_decode(pieces[1])?;
        let parent_trace_segment_id = Self::b64_decode(pieces[2])?;
        let parent_span_id = Self::parse_parent_span_id(pieces[3])?;
        let parent_service = Self::b64_decode(pieces[4])?;
        let parent_service_instance = Self::b64_decode(pieces[5])?;
        let destination_endpoint = Self::b64_decode(pieces[6])?;
        let destination_address = Self::b64_decode(pieces[7])?;

        Ok(PropagationContext::new(
            do_sample,
            parent_trace_id,
            parent_trace_segment_id,
            parent_span_id,
            parent_service,
            parent_service_instance,
            destination_endpoint,
            destination_address,
        ))
    }

    fn parse_parent_span_id(id: &str) -> Result<i32, HeaderParseError> {
        id.parse::<i32>().map_err(|_| HeaderParseError::InvalidParentSpanId)
    }

    fn parse_sample_status(status: &str) -> Result<bool, HeaderParseError> {
        match status {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(HeaderParseError::InvalidSampleStatus),
        }
    }

    fn b64_decode(enc: &str) -> Result<String, HeaderParseError> {
        let bytes = decode(enc)?;
        String::from_utf8(bytes).map_err(|_| HeaderParseError::InvalidUtf8)
    }
}

pub struct ContextEncoder;

impl ContextEncoder {
    pub fn encode(context: &PropagationContext) -> String {
        format!(
            "{}-{}-{}-{}-{}-{}-{}-{}",
            i32::from(context.do_sample),
            encode(&context.parent_trace_id),
            encode(&context.parent_trace_segment_id),
            context.parent_span_id,
            encode(&context.parent_service),
            encode(&context.parent_service_instance),
            encode(&context.destination_endpoint),
            encode(&context.destination_address),
        )
    }
}

/// Codec for the `sw8-correlation` header: `,`-joined `b64(key):b64(value)`
/// entries. Malformed entries are skipped rather than failing the whole
/// header, for forward compatibility with future fields.
pub struct CorrelationHeaderCodec;

impl CorrelationHeaderCodec {
    pub fn encode(correlation: &CorrelationContext) -> String {
        correlation
            .iter()
            .map(|(k, v)| format!("{}:{}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn decode(header_value: &str) -> CorrelationContext {
        Self::decode_with_capacity(header_value, DEFAULT_MAX_KEYS, DEFAULT_MAX_VALUE_BYTES)
    }

    /// As `decode`, but builds the resulting store under a caller-chosen
    /// capacity policy instead of the default `(3, 128)`.
    pub fn decode_with_capacity(header_value: &str, max_keys: usize, max_value_bytes: usize) -> CorrelationContext {
        let mut correlation = CorrelationContext::with_capacity(max_keys, max_value_bytes);
        if header_value.is_empty() {
            return correlation;
        }

        for entry in header_value.split(',') {
            let mut parts = entry.splitn(2, ':');
            let key = parts.next();
            let value = parts.next();
            let (Some(key), Some(value)) = (key, value) else {
                continue;
            };
            let (Ok(key), Ok(value)) = (decode(key), decode(value)) else {
                continue;
            };
            let (Ok(key), Ok(value)) = (String::from_utf8(key), String::from_utf8(value)) else {
                continue;
            };
            correlation.put(&key, &value);
        }

        correlation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_header() -> String {
        format!(
            "1-{}-{}-3-{}-{}-{}-{}",
            encode("trace-id-value"),
            encode("segment-id-value"),
            encode("service"),
            encode("instance"),
            encode("/endpoint"),
            encode("127.0.0.1:8080"),
        )
    }

    #[test]
    fn basic() {
        let header = fixture_header();
        let decoded = ContextDecoder::new(&header).decode().unwrap();
        assert!(decoded.do_sample);
        assert_eq!(decoded.parent_trace_id, "trace-id-value");
        assert_eq!(decoded.parent_trace_segment_id, "segment-id-value");
        assert_eq!(decoded.parent_span_id, 3);
        assert_eq!(decoded.parent_service, "service");
        assert_eq!(decoded.parent_service_instance, "instance");
        assert_eq!(decoded.destination_endpoint, "/endpoint");
        assert_eq!(decoded.destination_address, "127.0.0.1:8080");
        assert_eq!(ContextEncoder::encode(&decoded), header);
    }

    #[test]
    fn less_field() {
        let header = "1-a-b-c".to_string();
        assert_eq!(
            ContextDecoder::new(&header).decode(),
            Err(HeaderParseError::InsufficientEntities(4))
        );
    }

    #[test]
    fn more_field() {
        let mut header = fixture_header();
        header.push_str("-extra");
        assert_eq!(
            ContextDecoder::new(&header).decode(),
            Err(HeaderParseError::InsufficientEntities(9))
        );
    }

    #[test]
    fn invalid_sample() {
        let header = fixture_header().replacen('1', "9", 1);
        assert_eq!(
            ContextDecoder::new(&header).decode(),
            Err(HeaderParseError::InvalidSampleStatus)
        );
    }

    #[test]
    fn empty_header() {
        assert_eq!(ContextDecoder::new("").decode(), Err(HeaderParseError::EmptyHeader));
    }

    #[test]
    fn correlation_round_trip() {
        let mut correlation = CorrelationContext::new();
        correlation.put("k1", "v1");
        correlation.put("k2", "v2");
        let encoded = CorrelationHeaderCodec::encode(&correlation);
        let decoded = CorrelationHeaderCodec::decode(&encoded);
        assert_eq!(decoded.get("k1"), "v1");
        assert_eq!(decoded.get("k2"), "v2");
    }

    #[test]
    fn correlation_encode_empty_mapping_is_empty_string() {
        let correlation = CorrelationContext::new();
        assert_eq!(CorrelationHeaderCodec::encode(&correlation), "");
    }

    #[test]
    fn correlation_decode_skips_malformed_entries() {
        let decoded = CorrelationHeaderCodec::decode("not-base64-no-colon,,");
        assert!(decoded.is_empty());
    }
}
