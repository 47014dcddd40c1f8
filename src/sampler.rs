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

use arc_swap::ArcSwap;
use rand::Rng;
use std::sync::Arc;

pub const SAMPLE_RATE_CONFIG_KEY: &str = "agent.sample_rate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherEvent {
    Modify,
    Deleted,
}

/// A dynamic-configuration watcher. The configuration-discovery client
/// dispatches `notify` when the backend reports the watched key changed.
pub trait ConfigWatcher: Send + Sync {
    fn key(&self) -> &str;
    fn value(&self) -> String;
    fn notify(&self, event: WatcherEvent, new_value: Option<&str>);
}

#[derive(Clone)]
enum SamplerKind {
    Const(bool),
    Random { rate: f64, threshold: u32 },
}

impl SamplerKind {
    fn from_rate(rate: f64) -> Self {
        if rate <= 0.0 {
            SamplerKind::Const(false)
        } else if rate >= 1.0 {
            SamplerKind::Const(true)
        } else {
            SamplerKind::Random {
                rate,
                threshold: (rate * 100.0).floor() as u32,
            }
        }
    }

    fn is_sampled(&self) -> bool {
        match self {
            SamplerKind::Const(sampled) => *sampled,
            // A thread-local generator avoids the contention a single
            // mutex-guarded RNG would add under concurrent sampling.
            SamplerKind::Random { threshold, .. } => rand::thread_rng().gen_range(0..100) <= *threshold,
        }
    }
}

/// Const, random, or dynamically-reconfigurable sampling. The dynamic
/// variant is also a `ConfigWatcher`: registering it with the
/// configuration-discovery client lets the backend push new rates live.
pub struct Sampler {
    inner: ArcSwap<SamplerKind>,
    default_rate: f64,
}

impl Sampler {
    pub fn constant(sampled: bool) -> Arc<Self> {
        Arc::new(Sampler {
            inner: ArcSwap::from_pointee(SamplerKind::Const(sampled)),
            default_rate: if sampled { 1.0 } else { 0.0 },
        })
    }

    pub fn random(rate: f64) -> Arc<Self> {
        Arc::new(Sampler {
            inner: ArcSwap::from_pointee(SamplerKind::from_rate(rate)),
            default_rate: rate,
        })
    }

    /// `default_rate` is restored whenever the backend reports the
    /// `agent.sample_rate` key deleted.
    pub fn dynamic(default_rate: f64) -> Arc<Self> {
        Arc::new(Sampler {
            inner: ArcSwap::from_pointee(SamplerKind::from_rate(default_rate)),
            default_rate,
        })
    }

    pub fn is_sampled(&self) -> bool {
        self.inner.load().is_sampled()
    }
}

impl ConfigWatcher for Sampler {
    fn key(&self) -> &str {
        SAMPLE_RATE_CONFIG_KEY
    }

    fn value(&self) -> String {
        match &**self.inner.load() {
            SamplerKind::Const(true) => "1".to_string(),
            SamplerKind::Const(false) => "0".to_string(),
            SamplerKind::Random { rate, .. } => rate.to_string(),
        }
    }

    fn notify(&self, event: WatcherEvent, new_value: Option<&str>) {
        match event {
            WatcherEvent::Deleted => {
                self.inner.store(Arc::new(SamplerKind::from_rate(self.default_rate)));
            }
            WatcherEvent::Modify => {
                if let Some(rate) = new_value.and_then(|v| v.parse::<f64>().ok()) {
                    self.inner.store(Arc::new(SamplerKind::from_rate(rate)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_sampler() {
        assert!(Sampler::constant(true).is_sampled());
        assert!(!Sampler::constant(false).is_sampled());
    }

    #[test]
    fn random_threshold_boundaries() {
        assert!(!Sampler::random(0.0).is_sampled());
        assert!(Sampler::random(1.0).is_sampled());
    }

    #[test]
    fn dynamic_applies_modify_and_reverts_on_delete() {
        let sampler = Sampler::dynamic(1.0);
        assert!(sampler.is_sampled());

        sampler.notify(WatcherEvent::Modify, Some("0"));
        assert!(!sampler.is_sampled());

        sampler.notify(WatcherEvent::Deleted, None);
        assert!(sampler.is_sampled());
    }

    #[test]
    fn dynamic_rebuilds_inner_sampler_at_extremes() {
        let sampler = Sampler::dynamic(0.5);
        sampler.notify(WatcherEvent::Modify, Some("2.0"));
        assert!(sampler.is_sampled());
        sampler.notify(WatcherEvent::Modify, Some("-1.0"));
        assert!(!sampler.is_sampled());
    }
}
