//! Runtime handle wiring the window manager into Leptos signals.
//!
//! [`DesktopRuntime`] owns the long-lived [`WindowManager`] instance and mirrors its state into a
//! signal after every transition. Pointer-gesture previews live in a separate interaction signal
//! and never reach the manager until the gesture ends. UI composition stays in
//! [`crate::components`].

use std::rc::Rc;

use leptos::*;

use crate::{
    apps,
    interaction::{pointer_down_action, InteractionState, PointerPosition, ResizeEdge},
    model::{AppId, WindowId, WindowManagerState},
    reducer::{WindowAction, WindowEffect},
    telemetry::TelemetrySink,
    window_manager::WindowManager,
};

#[derive(Clone, Copy)]
/// Handle passed to shell components for reading window state and dispatching window actions.
pub struct DesktopRuntime {
    manager: StoredValue<WindowManager>,
    /// Reactive mirror of the manager's state, replaced whole after each transition.
    pub state: RwSignal<WindowManagerState>,
    /// Reactive pointer drag/resize interaction state.
    pub interaction: RwSignal<InteractionState>,
}

impl DesktopRuntime {
    /// Creates the window manager and its signals in the current reactive owner.
    pub fn new(telemetry: Rc<dyn TelemetrySink>) -> Self {
        let manager = WindowManager::new(telemetry);
        let state = create_rw_signal(manager.state().clone());
        Self {
            manager: store_value(manager),
            state,
            interaction: create_rw_signal(InteractionState::default()),
        }
    }

    fn run(&self, apply: impl FnOnce(&mut WindowManager) -> Vec<WindowEffect>) -> Vec<WindowEffect> {
        let Some(effects) = self.manager.try_update_value(apply) else {
            logging::warn!("window manager dropped before dispatch");
            return Vec::new();
        };
        let changed = effects
            .iter()
            .any(|effect| !matches!(effect, WindowEffect::Ignored { .. }));
        if changed {
            if let Some(next) = self.manager.try_with_value(|m| m.state().clone()) {
                self.state.set(next);
            }
        }
        effects
    }

    pub fn dispatch(&self, action: WindowAction) -> Vec<WindowEffect> {
        self.run(|manager| manager.dispatch(action))
    }

    /// Opens the app's window, or raises it when it is already open.
    pub fn open_app(&self, app_id: AppId) -> Vec<WindowEffect> {
        self.dispatch(WindowAction::Open(apps::default_open_request(app_id)))
    }

    /// Taskbar button press: restore when minimized, focus otherwise.
    pub fn activate(&self, window_id: &WindowId) -> Vec<WindowEffect> {
        self.run(|manager| manager.activate(window_id))
    }

    /// Pointer-down anywhere inside a window.
    pub fn focus_from_pointer(&self, window_id: &WindowId) {
        self.dispatch(pointer_down_action(window_id));
    }

    pub fn begin_move(&self, window_id: &WindowId, pointer: PointerPosition) {
        self.focus_from_pointer(window_id);
        let Some(window) = self.state.with_untracked(|s| s.window(window_id).cloned()) else {
            return;
        };
        self.interaction
            .update(|interaction| {
                interaction.begin_move(&window, pointer);
            });
    }

    pub fn begin_resize(&self, window_id: &WindowId, edge: ResizeEdge, pointer: PointerPosition) {
        self.focus_from_pointer(window_id);
        let Some(window) = self.state.with_untracked(|s| s.window(window_id).cloned()) else {
            return;
        };
        self.interaction
            .update(|interaction| {
                interaction.begin_resize(&window, edge, pointer);
            });
    }

    pub fn pointer_moved(&self, pointer: PointerPosition) {
        if self.interaction.with_untracked(InteractionState::is_active) {
            self.interaction.update(|interaction| interaction.update(pointer));
        }
    }

    /// Commits the active gesture's final geometry and discards its preview.
    pub fn end_pointer_interaction(&self) {
        if !self.interaction.with_untracked(InteractionState::is_active) {
            return;
        }
        let mut actions = Vec::new();
        self.interaction
            .update(|interaction| actions = interaction.end());
        for action in actions {
            self.dispatch(action);
        }
    }
}
