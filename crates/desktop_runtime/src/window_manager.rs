//! Explicitly constructed window manager instance that owns the window collection.
//!
//! All mutation goes through [`WindowManager::dispatch`]: the next state is derived from a copy of
//! the current one by [`reduce_windows`] and installed as a whole, then the resulting effects are
//! forwarded to the injected [`TelemetrySink`].

use std::rc::Rc;

use crate::{
    model::{OpenWindowRequest, WindowId, WindowManagerState},
    reducer::{reduce_windows, WindowAction, WindowEffect},
    telemetry::{NoopTelemetrySink, TelemetrySink},
};

#[derive(Clone)]
pub struct WindowManager {
    state: WindowManagerState,
    telemetry: Rc<dyn TelemetrySink>,
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new(Rc::new(NoopTelemetrySink))
    }
}

impl WindowManager {
    pub fn new(telemetry: Rc<dyn TelemetrySink>) -> Self {
        Self {
            state: WindowManagerState::default(),
            telemetry,
        }
    }

    pub fn state(&self) -> &WindowManagerState {
        &self.state
    }

    pub fn dispatch(&mut self, action: WindowAction) -> Vec<WindowEffect> {
        let mut next = self.state.clone();
        let effects = reduce_windows(&mut next, action);
        self.state = next;
        for effect in &effects {
            self.telemetry.record(effect);
        }
        effects
    }

    pub fn open(&mut self, request: OpenWindowRequest) -> Vec<WindowEffect> {
        self.dispatch(WindowAction::Open(request))
    }

    pub fn close(&mut self, window_id: &WindowId) -> Vec<WindowEffect> {
        self.dispatch(WindowAction::Close {
            window_id: window_id.clone(),
        })
    }

    pub fn minimize(&mut self, window_id: &WindowId) -> Vec<WindowEffect> {
        self.dispatch(WindowAction::Minimize {
            window_id: window_id.clone(),
        })
    }

    pub fn maximize(&mut self, window_id: &WindowId) -> Vec<WindowEffect> {
        self.dispatch(WindowAction::ToggleMaximize {
            window_id: window_id.clone(),
        })
    }

    pub fn restore(&mut self, window_id: &WindowId) -> Vec<WindowEffect> {
        self.dispatch(WindowAction::Restore {
            window_id: window_id.clone(),
        })
    }

    pub fn focus(&mut self, window_id: &WindowId) -> Vec<WindowEffect> {
        self.dispatch(WindowAction::Focus {
            window_id: window_id.clone(),
        })
    }

    pub fn update_position(&mut self, window_id: &WindowId, x: i32, y: i32) -> Vec<WindowEffect> {
        self.dispatch(WindowAction::UpdatePosition {
            window_id: window_id.clone(),
            x,
            y,
        })
    }

    pub fn update_size(
        &mut self,
        window_id: &WindowId,
        width: i32,
        height: i32,
    ) -> Vec<WindowEffect> {
        self.dispatch(WindowAction::UpdateSize {
            window_id: window_id.clone(),
            width,
            height,
        })
    }

    /// Taskbar activation: restores a minimized window, focuses any other.
    ///
    /// Keeps `focus` away from minimized windows so a minimized window is never focused.
    pub fn activate(&mut self, window_id: &WindowId) -> Vec<WindowEffect> {
        let minimized = self
            .state
            .window(window_id)
            .map(|w| w.is_minimized)
            .unwrap_or(false);
        if minimized {
            self.restore(window_id)
        } else {
            self.focus(window_id)
        }
    }
}
