//! Window actions, emitted effects, and the pure transition function of the window manager.

use crate::model::{OpenWindowRequest, WindowId, WindowManagerState, WindowRecord};

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_windows`].
pub enum WindowAction {
    /// Create a window, or restore/raise the existing window with the same id.
    Open(OpenWindowRequest),
    /// Remove a window.
    Close {
        /// Window to close.
        window_id: WindowId,
    },
    /// Minimize a window and drop its focus.
    Minimize {
        /// Window to minimize.
        window_id: WindowId,
    },
    /// Flip the maximized flag.
    ToggleMaximize {
        /// Window to toggle.
        window_id: WindowId,
    },
    /// Un-minimize, focus, and raise a window.
    Restore {
        /// Window to restore.
        window_id: WindowId,
    },
    /// Focus and raise a window.
    Focus {
        /// Window to focus.
        window_id: WindowId,
    },
    /// Commit a window's final drag position.
    UpdatePosition {
        /// Window that moved.
        window_id: WindowId,
        /// New left edge.
        x: i32,
        /// New top edge.
        y: i32,
    },
    /// Commit a window's final resize dimensions.
    UpdateSize {
        /// Window that was resized.
        window_id: WindowId,
        /// New width.
        width: i32,
        /// New height.
        height: i32,
    },
}

impl WindowAction {
    pub fn window_id(&self) -> &WindowId {
        match self {
            Self::Open(req) => &req.id,
            Self::Close { window_id }
            | Self::Minimize { window_id }
            | Self::ToggleMaximize { window_id }
            | Self::Restore { window_id }
            | Self::Focus { window_id }
            | Self::UpdatePosition { window_id, .. }
            | Self::UpdateSize { window_id, .. } => window_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Open(_) => "open",
            Self::Close { .. } => "close",
            Self::Minimize { .. } => "minimize",
            Self::ToggleMaximize { .. } => "maximize",
            Self::Restore { .. } => "restore",
            Self::Focus { .. } => "focus",
            Self::UpdatePosition { .. } => "update_position",
            Self::UpdateSize { .. } => "update_size",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Record of what a transition did, handed to telemetry by the owner of the state.
pub enum WindowEffect {
    Opened {
        window_id: WindowId,
        z_index: u32,
    },
    /// `Open` hit an existing window and brought it to the front.
    Reopened {
        window_id: WindowId,
        z_index: u32,
        was_minimized: bool,
    },
    Closed {
        window_id: WindowId,
    },
    Minimized {
        window_id: WindowId,
    },
    MaximizeToggled {
        window_id: WindowId,
        maximized: bool,
    },
    Restored {
        window_id: WindowId,
        z_index: u32,
    },
    Focused {
        window_id: WindowId,
        z_index: u32,
    },
    Moved {
        window_id: WindowId,
        x: i32,
        y: i32,
    },
    Resized {
        window_id: WindowId,
        width: i32,
        height: i32,
    },
    /// The action referenced a window that is not tracked; state is unchanged.
    Ignored {
        action: &'static str,
        window_id: WindowId,
    },
}

impl WindowEffect {
    pub fn metric_name(&self) -> &'static str {
        match self {
            Self::Opened { .. } => "window.opened",
            Self::Reopened { .. } => "window.reopened",
            Self::Closed { .. } => "window.closed",
            Self::Minimized { .. } => "window.minimized",
            Self::MaximizeToggled { .. } => "window.maximize_toggled",
            Self::Restored { .. } => "window.restored",
            Self::Focused { .. } => "window.focused",
            Self::Moved { .. } => "window.moved",
            Self::Resized { .. } => "window.resized",
            Self::Ignored { .. } => "window.ignored",
        }
    }
}

/// Applies a [`WindowAction`] to `state` and returns the resulting effects.
///
/// Actions that reference an unknown window leave `state` untouched, including the z-index
/// counter, and report [`WindowEffect::Ignored`].
pub fn reduce_windows(state: &mut WindowManagerState, action: WindowAction) -> Vec<WindowEffect> {
    let action_name = action.name();
    let mut effects = Vec::new();
    match action {
        WindowAction::Open(req) => match find_window_mut(state, &req.id) {
            Some(window) => {
                let was_minimized = window.is_minimized;
                window.is_minimized = false;
                let window_id = req.id;
                let z_index = bring_to_front(state, &window_id);
                effects.push(WindowEffect::Reopened {
                    window_id,
                    z_index,
                    was_minimized,
                });
            }
            None => {
                let z_index = allocate_z_index(state);
                let takes_focus = !req.is_minimized;
                if takes_focus {
                    clear_focus(state);
                }
                let window_id = req.id.clone();
                state.windows.push(WindowRecord {
                    id: req.id,
                    title: req.title,
                    icon: req.icon,
                    content: req.content,
                    rect: req.rect,
                    min_width: req.min_width,
                    min_height: req.min_height,
                    z_index,
                    is_minimized: req.is_minimized,
                    is_maximized: req.is_maximized,
                    is_focused: takes_focus,
                });
                effects.push(WindowEffect::Opened { window_id, z_index });
            }
        },
        WindowAction::Close { window_id } => {
            let before_len = state.windows.len();
            state.windows.retain(|w| w.id != window_id);
            if state.windows.len() == before_len {
                effects.push(ignored(action_name, window_id));
            } else {
                effects.push(WindowEffect::Closed { window_id });
            }
        }
        WindowAction::Minimize { window_id } => match find_window_mut(state, &window_id) {
            Some(window) => {
                window.is_minimized = true;
                window.is_focused = false;
                effects.push(WindowEffect::Minimized { window_id });
            }
            None => effects.push(ignored(action_name, window_id)),
        },
        WindowAction::ToggleMaximize { window_id } => match find_window_mut(state, &window_id) {
            Some(window) => {
                window.is_maximized = !window.is_maximized;
                let maximized = window.is_maximized;
                effects.push(WindowEffect::MaximizeToggled {
                    window_id,
                    maximized,
                });
            }
            None => effects.push(ignored(action_name, window_id)),
        },
        WindowAction::Restore { window_id } => match find_window_mut(state, &window_id) {
            Some(window) => {
                window.is_minimized = false;
                let z_index = bring_to_front(state, &window_id);
                effects.push(WindowEffect::Restored { window_id, z_index });
            }
            None => effects.push(ignored(action_name, window_id)),
        },
        WindowAction::Focus { window_id } => {
            if state.window(&window_id).is_some() {
                let z_index = bring_to_front(state, &window_id);
                effects.push(WindowEffect::Focused { window_id, z_index });
            } else {
                effects.push(ignored(action_name, window_id));
            }
        }
        WindowAction::UpdatePosition { window_id, x, y } => {
            match find_window_mut(state, &window_id) {
                Some(window) => {
                    window.rect.x = x;
                    window.rect.y = y;
                    effects.push(WindowEffect::Moved { window_id, x, y });
                }
                None => effects.push(ignored(action_name, window_id)),
            }
        }
        WindowAction::UpdateSize {
            window_id,
            width,
            height,
        } => match find_window_mut(state, &window_id) {
            Some(window) => {
                window.rect.width = width;
                window.rect.height = height;
                effects.push(WindowEffect::Resized {
                    window_id,
                    width,
                    height,
                });
            }
            None => effects.push(ignored(action_name, window_id)),
        },
    }
    effects
}

fn ignored(action: &'static str, window_id: WindowId) -> WindowEffect {
    WindowEffect::Ignored { action, window_id }
}

fn find_window_mut<'a>(
    state: &'a mut WindowManagerState,
    window_id: &WindowId,
) -> Option<&'a mut WindowRecord> {
    state.windows.iter_mut().find(|w| &w.id == window_id)
}

fn allocate_z_index(state: &mut WindowManagerState) -> u32 {
    state.top_z_index = state.top_z_index.saturating_add(1);
    state.top_z_index
}

fn clear_focus(state: &mut WindowManagerState) {
    for window in &mut state.windows {
        window.is_focused = false;
    }
}

/// Gives `window_id` focus and a fresh top z-index. The caller has checked that it exists.
fn bring_to_front(state: &mut WindowManagerState, window_id: &WindowId) -> u32 {
    let z_index = allocate_z_index(state);
    for window in &mut state.windows {
        let target = &window.id == window_id;
        window.is_focused = target;
        if target {
            window.z_index = z_index;
        }
    }
    z_index
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{AppId, WindowContent, WindowRect, BASE_Z_INDEX};

    fn request(id: &str, title: &str) -> OpenWindowRequest {
        OpenWindowRequest::new(id, title, WindowContent::app(AppId::Chat)).with_rect(WindowRect {
            x: 0,
            y: 0,
            width: 400,
            height: 300,
        })
    }

    fn record<'a>(state: &'a WindowManagerState, id: &str) -> &'a WindowRecord {
        state.window(&WindowId::from(id)).expect("window present")
    }

    fn focused_count(state: &WindowManagerState) -> usize {
        state.windows.iter().filter(|w| w.is_focused).count()
    }

    fn id(raw: &str) -> WindowId {
        WindowId::from(raw)
    }

    #[test]
    fn documented_open_minimize_reopen_close_sequence() {
        let mut state = WindowManagerState::default();
        assert_eq!(state.top_z_index, BASE_Z_INDEX);

        reduce_windows(&mut state, WindowAction::Open(request("a", "Notes")));
        assert_eq!(state.windows.len(), 1);
        let a = record(&state, "a");
        assert!(a.is_focused);
        assert!(!a.is_minimized);
        assert_eq!(a.z_index, 101);

        reduce_windows(&mut state, WindowAction::Open(request("b", "Browser")));
        assert!(!record(&state, "a").is_focused);
        assert!(record(&state, "b").is_focused);
        assert_eq!(record(&state, "b").z_index, 102);

        let b_before = record(&state, "b").clone();
        reduce_windows(&mut state, WindowAction::Minimize { window_id: id("a") });
        assert!(record(&state, "a").is_minimized);
        assert!(!record(&state, "a").is_focused);
        assert_eq!(record(&state, "b"), &b_before);

        let effects = reduce_windows(&mut state, WindowAction::Open(request("a", "Notes")));
        assert_eq!(state.windows.len(), 2);
        let a = record(&state, "a");
        assert!(!a.is_minimized);
        assert!(a.is_focused);
        assert_eq!(a.z_index, 103);
        assert!(!record(&state, "b").is_focused);
        assert_eq!(
            effects,
            vec![WindowEffect::Reopened {
                window_id: id("a"),
                z_index: 103,
                was_minimized: true,
            }]
        );

        reduce_windows(&mut state, WindowAction::Close { window_id: id("b") });
        assert_eq!(state.windows.len(), 1);
        assert_eq!(state.windows[0].id, id("a"));
    }

    #[test]
    fn unknown_window_ids_leave_state_untouched() {
        let mut state = WindowManagerState::default();
        reduce_windows(&mut state, WindowAction::Open(request("a", "Notes")));
        reduce_windows(&mut state, WindowAction::Open(request("b", "Browser")));
        let before = state.clone();

        let missing = id("nonexistent");
        let actions = vec![
            WindowAction::Focus {
                window_id: missing.clone(),
            },
            WindowAction::Close {
                window_id: missing.clone(),
            },
            WindowAction::Minimize {
                window_id: missing.clone(),
            },
            WindowAction::ToggleMaximize {
                window_id: missing.clone(),
            },
            WindowAction::Restore {
                window_id: missing.clone(),
            },
            WindowAction::UpdatePosition {
                window_id: missing.clone(),
                x: 5,
                y: 5,
            },
            WindowAction::UpdateSize {
                window_id: missing.clone(),
                width: 10,
                height: 10,
            },
        ];
        for action in actions {
            let name = action.name();
            let effects = reduce_windows(&mut state, action);
            assert_eq!(
                effects,
                vec![WindowEffect::Ignored {
                    action: name,
                    window_id: missing.clone(),
                }]
            );
        }

        assert_eq!(state, before);
    }

    #[test]
    fn reopening_a_visible_window_raises_it_without_moving_it() {
        let mut state = WindowManagerState::default();
        reduce_windows(&mut state, WindowAction::Open(request("a", "Notes")));
        reduce_windows(
            &mut state,
            WindowAction::UpdatePosition {
                window_id: id("a"),
                x: 33,
                y: 44,
            },
        );
        reduce_windows(&mut state, WindowAction::Open(request("b", "Browser")));

        reduce_windows(&mut state, WindowAction::Open(request("a", "Renamed")));

        let a = record(&state, "a");
        assert_eq!(state.windows.len(), 2);
        assert_eq!(a.title, "Notes");
        assert_eq!((a.rect.x, a.rect.y), (33, 44));
        assert_eq!(a.z_index, 103);
        assert!(a.is_focused);
        assert!(!record(&state, "b").is_focused);
    }

    #[test]
    fn bring_to_front_operations_allocate_strictly_increasing_z_indices() {
        let mut state = WindowManagerState::default();
        reduce_windows(&mut state, WindowAction::Open(request("a", "A")));
        reduce_windows(&mut state, WindowAction::Open(request("b", "B")));
        reduce_windows(&mut state, WindowAction::Minimize { window_id: id("b") });

        let mut last = record(&state, "b").z_index;
        let sequence = vec![
            WindowAction::Focus { window_id: id("a") },
            WindowAction::Restore { window_id: id("b") },
            WindowAction::Focus { window_id: id("b") },
            WindowAction::Open(request("a", "A")),
            WindowAction::Open(request("c", "C")),
        ];
        for action in sequence {
            let target = action.window_id().clone();
            reduce_windows(&mut state, action);
            let z = state.window(&target).expect("target").z_index;
            assert!(z > last, "z-index {z} must exceed {last}");
            assert!(state.windows.iter().all(|w| w.id == target || w.z_index < z));
            assert_eq!(focused_count(&state), 1);
            last = z;
        }
    }

    #[test]
    fn closing_does_not_renumber_or_reuse_z_indices() {
        let mut state = WindowManagerState::default();
        reduce_windows(&mut state, WindowAction::Open(request("a", "A")));
        reduce_windows(&mut state, WindowAction::Open(request("b", "B")));
        reduce_windows(&mut state, WindowAction::Close { window_id: id("b") });

        assert_eq!(record(&state, "a").z_index, 101);
        assert_eq!(state.top_z_index, 102);

        reduce_windows(&mut state, WindowAction::Open(request("b", "B")));
        assert_eq!(record(&state, "b").z_index, 103);
    }

    #[test]
    fn maximize_toggles_without_touching_focus_stack_or_minimized_flag() {
        let mut state = WindowManagerState::default();
        reduce_windows(&mut state, WindowAction::Open(request("a", "A")));
        reduce_windows(&mut state, WindowAction::Open(request("b", "B")));
        reduce_windows(&mut state, WindowAction::Minimize { window_id: id("a") });
        let before = record(&state, "a").clone();

        let effects = reduce_windows(
            &mut state,
            WindowAction::ToggleMaximize { window_id: id("a") },
        );
        let a = record(&state, "a");
        assert!(a.is_maximized);
        assert!(a.is_minimized);
        assert!(!a.is_focused);
        assert_eq!(a.z_index, before.z_index);
        assert_eq!(state.top_z_index, 102);
        assert_eq!(
            effects,
            vec![WindowEffect::MaximizeToggled {
                window_id: id("a"),
                maximized: true,
            }]
        );

        reduce_windows(
            &mut state,
            WindowAction::ToggleMaximize { window_id: id("a") },
        );
        assert!(!record(&state, "a").is_maximized);
    }

    #[test]
    fn minimize_keeps_z_index_and_maximized_flag() {
        let mut state = WindowManagerState::default();
        reduce_windows(&mut state, WindowAction::Open(request("a", "A")));
        reduce_windows(
            &mut state,
            WindowAction::ToggleMaximize { window_id: id("a") },
        );
        reduce_windows(&mut state, WindowAction::Minimize { window_id: id("a") });

        let a = record(&state, "a");
        assert!(a.is_maximized);
        assert!(a.is_minimized);
        assert!(!a.is_focused);
        assert_eq!(a.z_index, 101);
        assert_eq!(state.focused_window_id(), None);
    }

    #[test]
    fn focus_leaves_minimized_and_maximized_flags_alone() {
        let mut state = WindowManagerState::default();
        reduce_windows(&mut state, WindowAction::Open(request("a", "A")));
        reduce_windows(
            &mut state,
            WindowAction::ToggleMaximize { window_id: id("a") },
        );
        reduce_windows(&mut state, WindowAction::Open(request("b", "B")));

        reduce_windows(&mut state, WindowAction::Focus { window_id: id("a") });

        let a = record(&state, "a");
        assert!(a.is_focused);
        assert!(a.is_maximized);
        assert!(!a.is_minimized);
        assert_eq!(state.focused_window_id(), Some(&id("a")));
    }

    #[test]
    fn position_and_size_updates_change_only_geometry() {
        let mut state = WindowManagerState::default();
        reduce_windows(&mut state, WindowAction::Open(request("a", "A")));
        let before = record(&state, "a").clone();

        reduce_windows(
            &mut state,
            WindowAction::UpdatePosition {
                window_id: id("a"),
                x: -20,
                y: 75,
            },
        );
        let effects = reduce_windows(
            &mut state,
            WindowAction::UpdateSize {
                window_id: id("a"),
                width: 640,
                height: 480,
            },
        );

        let a = record(&state, "a");
        assert_eq!(
            a.rect,
            WindowRect {
                x: -20,
                y: 75,
                width: 640,
                height: 480,
            }
        );
        assert_eq!(a.z_index, before.z_index);
        assert_eq!(a.is_focused, before.is_focused);
        assert_eq!(
            effects,
            vec![WindowEffect::Resized {
                window_id: id("a"),
                width: 640,
                height: 480,
            }]
        );
    }

    #[test]
    fn opening_a_window_requested_minimized_does_not_steal_focus() {
        let mut state = WindowManagerState::default();
        reduce_windows(&mut state, WindowAction::Open(request("a", "A")));
        let mut minimized = request("b", "B");
        minimized.is_minimized = true;

        reduce_windows(&mut state, WindowAction::Open(minimized));

        let b = record(&state, "b");
        assert!(b.is_minimized);
        assert!(!b.is_focused);
        assert_eq!(b.z_index, 102);
        assert!(record(&state, "a").is_focused);
    }

    #[test]
    fn close_removes_exactly_one_window() {
        let mut state = WindowManagerState::default();
        reduce_windows(&mut state, WindowAction::Open(request("a", "A")));
        reduce_windows(&mut state, WindowAction::Open(request("b", "B")));
        reduce_windows(&mut state, WindowAction::Open(request("c", "C")));

        reduce_windows(&mut state, WindowAction::Close { window_id: id("b") });
        assert_eq!(state.windows.len(), 2);
        reduce_windows(&mut state, WindowAction::Close { window_id: id("b") });
        assert_eq!(state.windows.len(), 2);
        assert!(state.window(&id("b")).is_none());
    }
}
