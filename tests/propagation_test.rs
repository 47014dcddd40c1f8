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

use skywalking_rs_agent::context::propagation::{ContextDecoder, ContextEncoder};

#[test]
fn basic() {
    let data = "1-MQ==-NQ==-3-bWVzaA==-aW5zdGFuY2U=-L2FwaS92MS9oZWFsdGg=-ZXhhbXBsZS5jb206ODA4MA==";
    let decoder = ContextDecoder::new(data);
    let res = decoder.decode().unwrap();

    assert_eq!(res.do_sample, true);
    assert_eq!(res.parent_trace_id, "1");
    assert_eq!(res.parent_trace_segment_id, "5");
    assert_eq!(res.parent_span_id, 3);
    assert_eq!(res.parent_service, "mesh");
    assert_eq!(res.parent_service_instance, "instance");
    assert_eq!(res.destination_endpoint, "/api/v1/health");
    assert_eq!(res.destination_address, "example.com:8080");
}

#[test]
fn less_field() {
    let data = "1-MQ==-NQ==-3-bWVzaA==-aW5zdGFuY2U=-L2FwaS92MS9oZWFsdGg=";
    let decoder = ContextDecoder::new(data);
    assert!(decoder.decode().is_err());
}

#[test]
fn more_field() {
    let data = "1-MQ==-NQ==-3-bWVzaA==-aW5zdGFuY2U=-L2FwaS92MS9oZWFsdGg=-ZXhhbXBsZS5jb206ODA4MA==-hogehoge";
    let decoder = ContextDecoder::new(data);
    assert!(decoder.decode().is_err());
}

#[test]
fn invalid_sample() {
    let data = "3-MQ==-NQ==-3-bWVzaA==-aW5zdGFuY2U=-L2FwaS92MS9oZWFsdGg=-ZXhhbXBsZS5jb206ODA4MA==";
    let decoder = ContextDecoder::new(data);
    assert!(decoder.decode().is_err());
}

#[test]
fn decode_sw8_literal_fixture() {
    let data = "1-MWYyZDRiZjQ3YmY3MTFlYWI3OTRhY2RlNDgwMDExMjI=-MWU3YzIwNGE3YmY3MTFlYWI4NThhY2RlNDgwMDExMjI=-0-c2VydmljZQ==-aW5zdGFuY2U=-cHJvcGFnYXRpb24=-cHJvcGFnYXRpb246NTU2Ng==";
    let res = ContextDecoder::new(data).decode().unwrap();

    assert_eq!(res.do_sample, true);
    assert_eq!(res.parent_trace_id, "1f2d4bf47bf711eab794acde48001122");
    assert_eq!(res.parent_trace_segment_id, "1e7c204a7bf711eab858acde48001122");
    assert_eq!(res.parent_span_id, 0);
    assert_eq!(res.parent_service, "service");
    assert_eq!(res.parent_service_instance, "instance");
    assert_eq!(res.destination_endpoint, "propagation");
    assert_eq!(res.destination_address, "propagation:5566");
}

#[test]
fn encode_sw8_literal_fixture_round_trips() {
    let data = "1-MWYyZDRiZjQ3YmY3MTFlYWI3OTRhY2RlNDgwMDExMjI=-MWU3YzIwNGE3YmY3MTFlYWI4NThhY2RlNDgwMDExMjI=-0-c2VydmljZQ==-aW5zdGFuY2U=-cHJvcGFnYXRpb24=-cHJvcGFnYXRpb246NTU2Ng==";
    let parsed = ContextDecoder::new(data).decode().unwrap();
    assert_eq!(ContextEncoder::encode(&parsed), data);
}

#[test]
fn round_trip_through_encoder_and_decoder() {
    let data = "1-MQ==-NQ==-3-bWVzaA==-aW5zdGFuY2U=-L2FwaS92MS9oZWFsdGg=-ZXhhbXBsZS5jb206ODA4MA==";
    let parsed = ContextDecoder::new(data).decode().unwrap();
    let encoded = ContextEncoder::encode(&parsed);
    let reparsed = ContextDecoder::new(&encoded).decode().unwrap();
    assert_eq!(parsed, reparsed);
}
