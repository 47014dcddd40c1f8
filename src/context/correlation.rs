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

use std::collections::HashMap;

pub const DEFAULT_MAX_KEYS: usize = 3;
pub const DEFAULT_MAX_VALUE_BYTES: usize = 128;

/// Bounded key/value baggage carried alongside a segment and propagated by
/// value across process boundaries via the SW8-correlation header.
#[derive(Debug, Clone)]
pub struct CorrelationContext {
    entries: HashMap<String, String>,
    max_keys: usize,
    max_value_bytes: usize,
}

impl Default for CorrelationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationContext {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_KEYS, DEFAULT_MAX_VALUE_BYTES)
    }

    pub fn with_capacity(max_keys: usize, max_value_bytes: usize) -> Self {
        CorrelationContext {
            entries: HashMap::new(),
            max_keys,
            max_value_bytes,
        }
    }

    /// Empty key fails. Empty value deletes an existing entry. A value
    /// exceeding the capacity policy fails. Updating an existing key always
    /// succeeds; inserting a new key fails once at capacity.
    pub fn put(&mut self, key: &str, value: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        if value.is_empty() {
            self.entries.remove(key);
            return true;
        }
        if value.len() > self.max_value_bytes {
            return false;
        }
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_keys {
            return false;
        }
        self.entries.insert(key.to_string(), value.to_string());
        true
    }

    /// Absent key returns an empty string.
    pub fn get(&self, key: &str) -> String {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter()
    }
}
