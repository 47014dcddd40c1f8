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

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// A single process-wide PRNG, seeded once from the OS entropy source.
// go2sky does the equivalent with a `rand.New(rand.NewSource(time.Now().UnixNano()))`
// behind a `sync.Mutex`; `StdRng::from_entropy()` is the idiomatic Rust analogue.
static GENERATOR: Lazy<Mutex<StdRng>> = Lazy::new(|| Mutex::new(StdRng::from_entropy()));

pub struct RandomGenerator;

impl RandomGenerator {
    /// Draws a fresh 128-bit identifier.
    pub fn generate() -> u128 {
        GENERATOR.lock().gen::<u128>()
    }

    /// Draws a fresh identifier and renders it as 32-character lowercase hex,
    /// the wire format SW8 trace/segment ids use (bare hex, not an
    /// RFC-4122 UUID).
    pub fn generate_hex() -> String {
        format!("{:032x}", Self::generate())
    }
}
