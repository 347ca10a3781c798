//! Transient pointer-gesture state for window drag and resize.
//!
//! Sessions hold a preview rect that the view renders while the gesture is in flight. The
//! window manager only sees the final geometry, as [`WindowAction`]s returned from
//! [`InteractionState::end`].

use serde::{Deserialize, Serialize};

use crate::{
    model::{WindowId, WindowRecord, WindowRect},
    reducer::WindowAction,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ResizeEdge {
    pub const ALL: [ResizeEdge; 8] = [
        ResizeEdge::North,
        ResizeEdge::South,
        ResizeEdge::East,
        ResizeEdge::West,
        ResizeEdge::NorthEast,
        ResizeEdge::NorthWest,
        ResizeEdge::SouthEast,
        ResizeEdge::SouthWest,
    ];

    pub fn css_class(self) -> &'static str {
        match self {
            Self::North => "edge-n",
            Self::South => "edge-s",
            Self::East => "edge-e",
            Self::West => "edge-w",
            Self::NorthEast => "edge-ne",
            Self::NorthWest => "edge-nw",
            Self::SouthEast => "edge-se",
            Self::SouthWest => "edge-sw",
        }
    }

    fn moves_left(self) -> bool {
        matches!(self, Self::West | Self::NorthWest | Self::SouthWest)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::East | Self::NorthEast | Self::SouthEast)
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::North | Self::NorthEast | Self::NorthWest)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::South | Self::SouthEast | Self::SouthWest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub window_id: WindowId,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
    pub preview: WindowRect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSession {
    pub window_id: WindowId,
    pub edge: ResizeEdge,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
    pub min_width: i32,
    pub min_height: i32,
    pub preview: WindowRect,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub dragging: Option<DragSession>,
    pub resizing: Option<ResizeSession>,
}

impl InteractionState {
    pub fn is_active(&self) -> bool {
        self.dragging.is_some() || self.resizing.is_some()
    }

    /// Starts a drag. Returns `false` (and leaves state untouched) for maximized or minimized
    /// windows.
    pub fn begin_move(&mut self, window: &WindowRecord, pointer: PointerPosition) -> bool {
        if window.is_maximized || window.is_minimized {
            return false;
        }
        self.resizing = None;
        self.dragging = Some(DragSession {
            window_id: window.id.clone(),
            pointer_start: pointer,
            rect_start: window.rect,
            preview: window.rect,
        });
        true
    }

    pub fn begin_resize(
        &mut self,
        window: &WindowRecord,
        edge: ResizeEdge,
        pointer: PointerPosition,
    ) -> bool {
        if window.is_maximized || window.is_minimized {
            return false;
        }
        self.dragging = None;
        self.resizing = Some(ResizeSession {
            window_id: window.id.clone(),
            edge,
            pointer_start: pointer,
            rect_start: window.rect,
            min_width: window.min_width,
            min_height: window.min_height,
            preview: window.rect,
        });
        true
    }

    pub fn update(&mut self, pointer: PointerPosition) {
        if let Some(session) = self.dragging.as_mut() {
            let dx = pointer.x - session.pointer_start.x;
            let dy = pointer.y - session.pointer_start.y;
            session.preview = session.rect_start.offset(dx, dy);
        }
        if let Some(session) = self.resizing.as_mut() {
            let dx = pointer.x - session.pointer_start.x;
            let dy = pointer.y - session.pointer_start.y;
            session.preview = resize_rect(
                session.rect_start,
                session.edge,
                dx,
                dy,
                session.min_width,
                session.min_height,
            );
        }
    }

    /// Geometry to render for `window_id` while a gesture on it is in flight.
    pub fn preview_rect(&self, window_id: &WindowId) -> Option<WindowRect> {
        if let Some(session) = self.dragging.as_ref().filter(|s| &s.window_id == window_id) {
            return Some(session.preview);
        }
        self.resizing
            .as_ref()
            .filter(|s| &s.window_id == window_id)
            .map(|s| s.preview)
    }

    /// Finishes the active gesture and returns the manager actions that commit its result.
    pub fn end(&mut self) -> Vec<WindowAction> {
        let mut actions = Vec::new();
        if let Some(session) = self.dragging.take() {
            if session.preview != session.rect_start {
                actions.push(WindowAction::UpdatePosition {
                    window_id: session.window_id,
                    x: session.preview.x,
                    y: session.preview.y,
                });
            }
        }
        if let Some(session) = self.resizing.take() {
            let start = session.rect_start;
            let end = session.preview;
            if (end.width, end.height) != (start.width, start.height) {
                actions.push(WindowAction::UpdateSize {
                    window_id: session.window_id.clone(),
                    width: end.width,
                    height: end.height,
                });
            }
            if (end.x, end.y) != (start.x, start.y) {
                actions.push(WindowAction::UpdatePosition {
                    window_id: session.window_id,
                    x: end.x,
                    y: end.y,
                });
            }
        }
        actions
    }

    pub fn cancel(&mut self) {
        self.dragging = None;
        self.resizing = None;
    }
}

/// Pointer-down anywhere inside a window focuses it.
pub fn pointer_down_action(window_id: &WindowId) -> WindowAction {
    WindowAction::Focus {
        window_id: window_id.clone(),
    }
}

/// Applies a pointer delta to `start` along `edge`, clamping to the minimum size while the
/// opposite edge stays fixed.
pub fn resize_rect(
    start: WindowRect,
    edge: ResizeEdge,
    dx: i32,
    dy: i32,
    min_width: i32,
    min_height: i32,
) -> WindowRect {
    let mut rect = start;

    if edge.moves_right() {
        rect.width = (start.width + dx).max(min_width);
    } else if edge.moves_left() {
        rect.width = (start.width - dx).max(min_width);
        rect.x = start.x + start.width - rect.width;
    }

    if edge.moves_bottom() {
        rect.height = (start.height + dy).max(min_height);
    } else if edge.moves_top() {
        rect.height = (start.height - dy).max(min_height);
        rect.y = start.y + start.height - rect.height;
    }

    rect
}
