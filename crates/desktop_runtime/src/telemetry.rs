//! Telemetry sinks fed with window-manager effects after each transition.

use std::{cell::RefCell, collections::BTreeMap};

use leptos::logging;

use crate::reducer::WindowEffect;

/// Receives effects emitted by the window manager. Sinks are fire-and-forget.
pub trait TelemetrySink {
    fn record(&self, effect: &WindowEffect);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _: &WindowEffect) {}
}

/// Logs effects to the browser console and keeps per-metric counters.
#[derive(Debug, Default)]
pub struct ConsoleTelemetrySink {
    counters: RefCell<BTreeMap<&'static str, u64>>,
}

impl ConsoleTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, metric: &str) -> u64 {
        self.counters.borrow().get(metric).copied().unwrap_or(0)
    }

    pub fn counters(&self) -> BTreeMap<&'static str, u64> {
        self.counters.borrow().clone()
    }
}

impl TelemetrySink for ConsoleTelemetrySink {
    fn record(&self, effect: &WindowEffect) {
        let metric = effect.metric_name();
        *self.counters.borrow_mut().entry(metric).or_insert(0) += 1;
        match effect {
            WindowEffect::Ignored { action, window_id } => {
                logging::debug_warn!("{metric}: {action} on unknown window {window_id}");
            }
            WindowEffect::Moved { .. } | WindowEffect::Resized { .. } => {}
            other => logging::log!("{metric}: {other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::WindowId;

    #[test]
    fn console_sink_counts_effects_by_metric_name() {
        let sink = ConsoleTelemetrySink::new();
        let window_id = WindowId::from("chat");

        sink.record(&WindowEffect::Opened {
            window_id: window_id.clone(),
            z_index: 101,
        });
        sink.record(&WindowEffect::Moved {
            window_id: window_id.clone(),
            x: 1,
            y: 2,
        });
        sink.record(&WindowEffect::Moved {
            window_id,
            x: 3,
            y: 4,
        });

        assert_eq!(sink.counter("window.opened"), 1);
        assert_eq!(sink.counter("window.moved"), 2);
        assert_eq!(sink.counter("window.closed"), 0);
        assert_eq!(sink.counters().len(), 2);
    }
}
