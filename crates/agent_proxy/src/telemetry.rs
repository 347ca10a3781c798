//! In-process metrics for the agent endpoints.
//!
//! Counters are lock-free; distributions keep a bounded window of recent samples so the
//! snapshot stays cheap to compute.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;

use crate::prompt::AgentEndpoint;

const MAX_SAMPLES: usize = 1024;

#[derive(Debug, Default)]
struct Distribution {
    samples: VecDeque<f64>,
    count: u64,
    sum: f64,
}

impl Distribution {
    fn record(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
        self.count += 1;
        self.sum += value;
    }

    fn summary(&self) -> DistributionSummary {
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let percentile = |p: f64| -> f64 {
            if sorted.is_empty() {
                return 0.0;
            }
            let rank = ((sorted.len() - 1) as f64 * p).round() as usize;
            sorted[rank.min(sorted.len() - 1)]
        };
        DistributionSummary {
            count: self.count,
            sum: self.sum,
            min: sorted.first().copied().unwrap_or(0.0),
            max: sorted.last().copied().unwrap_or(0.0),
            mean: if self.count == 0 {
                0.0
            } else {
                self.sum / self.count as f64
            },
            p50: percentile(0.5),
            p95: percentile(0.95),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub counters: BTreeMap<&'static str, u64>,
    pub distributions: BTreeMap<String, DistributionSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Default)]
pub struct Telemetry {
    requests: AtomicU64,
    validation_failures: AtomicU64,
    start_failures: AtomicU64,
    text_chars: AtomicU64,
    tool_calls: AtomicU64,
    stream_errors: AtomicU64,
    stream_cancelled: AtomicU64,
    distributions: Mutex<BTreeMap<String, Distribution>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_start_failure(&self) {
        self.start_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prompt(&self, endpoint: AgentEndpoint, chars: usize) {
        self.observe("agent.prompt_chars", endpoint, chars as f64);
    }

    pub fn record_text(&self, chars: usize) {
        self.text_chars.fetch_add(chars as u64, Ordering::Relaxed);
    }

    pub fn record_tool_call(&self) {
        self.tool_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stream_end(&self, outcome: StreamOutcome) {
        match outcome {
            StreamOutcome::Completed => {}
            StreamOutcome::Failed => {
                self.stream_errors.fetch_add(1, Ordering::Relaxed);
            }
            StreamOutcome::Cancelled => {
                self.stream_cancelled.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_run(
        &self,
        endpoint: AgentEndpoint,
        duration_ms: f64,
        num_turns: Option<u32>,
        cost_usd: Option<f64>,
    ) {
        self.observe("agent.duration_ms", endpoint, duration_ms);
        if let Some(turns) = num_turns {
            self.observe("agent.num_turns", endpoint, f64::from(turns));
        }
        if let Some(cost) = cost_usd {
            self.observe("agent.cost_usd", endpoint, cost);
        }
    }

    fn observe(&self, metric: &str, endpoint: AgentEndpoint, value: f64) {
        let key = format!("{metric}{{endpoint={}}}", endpoint.name());
        // Samples remain valid after a poisoning panic.
        let mut distributions = self
            .distributions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        distributions.entry(key).or_default().record(value);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let counters = BTreeMap::from([
            ("agent.requests", self.requests.load(Ordering::Relaxed)),
            (
                "agent.validation_failures",
                self.validation_failures.load(Ordering::Relaxed),
            ),
            (
                "agent.start_failures",
                self.start_failures.load(Ordering::Relaxed),
            ),
            ("agent.text_chars", self.text_chars.load(Ordering::Relaxed)),
            ("agent.tool_calls", self.tool_calls.load(Ordering::Relaxed)),
            (
                "agent.stream_errors",
                self.stream_errors.load(Ordering::Relaxed),
            ),
            (
                "agent.stream_cancelled",
                self.stream_cancelled.load(Ordering::Relaxed),
            ),
        ]);
        let distributions = self
            .distributions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(name, distribution)| (name.clone(), distribution.summary()))
            .collect();
        TelemetrySnapshot {
            counters,
            distributions,
        }
    }

    #[cfg(test)]
    pub(crate) fn counter(&self, name: &str) -> u64 {
        self.snapshot().counters.get(name).copied().unwrap_or(0)
    }
}
