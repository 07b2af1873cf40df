// interaction.rs — pointer / touch / button input → view state changes

use crate::view_state::{DragSensitivity, ViewState};
use glam::DVec2;
use std::collections::BTreeMap;

/// Discrete on-screen controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ZoomIn,
    ZoomOut,
    Reset,
    TogglePlay,
    ToggleInfo,
    ToggleFullscreen,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(DVec2),
    PointerMove(DVec2),
    PointerUp,
    Touch { id: u64, phase: TouchPhase, position: DVec2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragSource {
    Pointer,
    Touch(u64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    source: DragSource,
    last: DVec2,
}

/// Drag state machine plus the auto-rotate flag.
///
/// Dragging and auto-rotation never overlap: starting a drag switches
/// auto-rotation off and ending it does not switch it back on.
#[derive(Debug, Clone)]
pub struct InteractionController {
    sensitivity: DragSensitivity,
    zoom_step: f64,
    drag: Option<Drag>,
    auto_rotating: bool,
    touches: BTreeMap<u64, DVec2>,
}

impl InteractionController {
    pub fn new(sensitivity: DragSensitivity, zoom_step: f64, auto_rotating: bool) -> Self {
        Self {
            sensitivity,
            zoom_step,
            drag: None,
            auto_rotating,
            touches: BTreeMap::new(),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_auto_rotating(&self) -> bool {
        self.auto_rotating
    }

    /// Only meaningful while dragging.
    pub fn last_pointer_position(&self) -> Option<DVec2> {
        self.drag.map(|d| d.last)
    }

    pub fn set_auto_rotating(&mut self, on: bool) {
        // a drag in progress keeps the upper hand
        self.auto_rotating = on && !self.is_dragging();
    }

    /// Applies one input event. Returns true when `view` changed.
    pub fn handle(&mut self, event: InputEvent, view: &mut ViewState) -> bool {
        match event {
            InputEvent::PointerDown(pos) => {
                // mouse events synthesized from a finger already on the surface
                if self.touches.is_empty() {
                    self.begin_drag(DragSource::Pointer, pos);
                }
                false
            }
            InputEvent::PointerMove(pos) => self.drag_to(DragSource::Pointer, pos, view),
            InputEvent::PointerUp => {
                if matches!(self.drag, Some(Drag { source: DragSource::Pointer, .. })) {
                    self.drag = None;
                }
                false
            }
            InputEvent::Touch { id, phase, position } => self.handle_touch(id, phase, position, view),
        }
    }

    fn handle_touch(&mut self, id: u64, phase: TouchPhase, position: DVec2, view: &mut ViewState) -> bool {
        match phase {
            TouchPhase::Started => {
                self.touches.insert(id, position);
                if self.touches.len() == 1 {
                    self.begin_drag(DragSource::Touch(id), position);
                } else {
                    // multi-touch is not a drag
                    self.drag = None;
                }
                false
            }
            TouchPhase::Moved => {
                if let Some(p) = self.touches.get_mut(&id) {
                    *p = position;
                }
                self.drag_to(DragSource::Touch(id), position, view)
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.touches.remove(&id);
                if matches!(self.drag, Some(Drag { source: DragSource::Touch(t), .. }) if t == id) {
                    self.drag = None;
                }
                false
            }
        }
    }

    fn begin_drag(&mut self, source: DragSource, pos: DVec2) {
        self.drag = Some(Drag { source, last: pos });
        self.auto_rotating = false;
    }

    fn drag_to(&mut self, source: DragSource, pos: DVec2, view: &mut ViewState) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        if drag.source != source {
            return false;
        }
        let delta = pos - drag.last;
        drag.last = pos;
        if delta == DVec2::ZERO {
            return false;
        }
        view.apply_drag(delta, self.sensitivity);
        true
    }

    /// Button-driven controls that act on the view. Returns true when `view`
    /// or the auto-rotate flag changed. Controls outside the view are ignored.
    pub fn activate(&mut self, control: Control, view: &mut ViewState) -> bool {
        match control {
            Control::ZoomIn => view.apply_zoom_delta(self.zoom_step),
            Control::ZoomOut => view.apply_zoom_delta(-self.zoom_step),
            Control::Reset => {
                let changed = !view.is_default() || !self.auto_rotating;
                view.reset();
                self.drag = None;
                self.auto_rotating = true;
                changed
            }
            Control::TogglePlay => {
                if self.is_dragging() {
                    return false;
                }
                self.auto_rotating = !self.auto_rotating;
                true
            }
            Control::ToggleInfo | Control::ToggleFullscreen | Control::Close => false,
        }
    }
}
