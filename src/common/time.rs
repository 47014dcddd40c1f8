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

use std::time::{SystemTime, UNIX_EPOCH};

/// Abstracts span/log timestamps so tests can substitute a deterministic
/// clock without touching the wall clock.
pub trait TimeFetcher: Send + Sync + 'static {
    fn get(&self) -> i64;
}

#[derive(Default, Clone, Copy)]
pub struct UnixTimeStampFetcher;

impl TimeFetcher for UnixTimeStampFetcher {
    fn get(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before unix epoch")
            .as_millis() as i64
    }
}
