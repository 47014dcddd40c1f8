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

use crate::sampler::{ConfigWatcher, WatcherEvent};
use crate::skywalking_proto::v3::Command;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const UUID_KEY: &str = "UUID";
const SERIAL_NUMBER_KEY: &str = "SerialNumber";

/// Dispatches backend-pushed configuration commands to registered watchers.
/// A command's `UUID` argument is the revision identifier; repeating the
/// same UUID is a no-op (idempotent re-delivery), otherwise every watcher is
/// compared against the incoming value and notified of exactly one of
/// `MODIFY` / `DELETED` / nothing.
pub struct ConfigurationDiscoveryService {
    uuid: Mutex<String>,
    watchers: Mutex<HashMap<String, Arc<dyn ConfigWatcher>>>,
    // Every key seen in a command's arguments, watched or not. Keys with no
    // registered watcher are stored here but never dispatched.
    values: Mutex<HashMap<String, String>>,
}

impl Default for ConfigurationDiscoveryService {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationDiscoveryService {
    pub fn new() -> Self {
        ConfigurationDiscoveryService {
            uuid: Mutex::new(String::new()),
            watchers: Mutex::new(HashMap::new()),
            values: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, watcher: Arc<dyn ConfigWatcher>) {
        self.watchers.lock().insert(watcher.key().to_string(), watcher);
    }

    pub fn current_uuid(&self) -> String {
        self.uuid.lock().clone()
    }

    /// Last value seen for `key`, whether or not a watcher is registered
    /// for it.
    pub fn stored_value(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    pub fn handle_command(&self, command: &Command) {
        let mut incoming: HashMap<String, String> = HashMap::new();
        let mut incoming_uuid = None;

        for arg in &command.args {
            match arg.key.as_str() {
                SERIAL_NUMBER_KEY => continue,
                UUID_KEY => incoming_uuid = Some(arg.value.clone()),
                key => {
                    incoming.insert(key.to_string(), arg.value.clone());
                }
            }
        }

        let new_uuid = incoming_uuid.unwrap_or_else(|| command.uuid.clone());

        let mut current_uuid = self.uuid.lock();
        if !new_uuid.is_empty() && *current_uuid == new_uuid {
            debug!(uuid = %new_uuid, "configuration revision already applied, skipping");
            return;
        }

        {
            let mut values = self.values.lock();
            for (key, value) in &incoming {
                values.insert(key.clone(), value.clone());
            }
        }

        let watchers = self.watchers.lock();
        for (key, watcher) in watchers.iter() {
            let current_value = watcher.value();
            match incoming.get(key) {
                None => {
                    if !current_value.is_empty() {
                        watcher.notify(WatcherEvent::Deleted, None);
                    }
                }
                Some(value) if value.is_empty() => {
                    if !current_value.is_empty() {
                        watcher.notify(WatcherEvent::Deleted, None);
                    }
                }
                Some(value) if *value != current_value => {
                    watcher.notify(WatcherEvent::Modify, Some(value));
                }
                Some(_) => {}
            }
        }

        *current_uuid = new_uuid;
    }
}
