// view_state.rs — yaw / pitch / zoom with clamp invariants

use glam::DVec2;

pub const PITCH_LIMIT: f64 = 30.0;
pub const ZOOM_MIN: f64 = 0.5;
pub const ZOOM_MAX: f64 = 3.0;
pub const ZOOM_DEFAULT: f64 = 1.0;
/// Zoom is kept in whole hundredths; smaller steps round away.
pub const ZOOM_RESOLUTION: f64 = 0.01;

/// Degrees-per-pixel factors applied to a drag delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSensitivity {
    pub yaw_per_px: f64,
    pub pitch_per_px: f64,
}

impl Default for DragSensitivity {
    fn default() -> Self {
        Self {
            yaw_per_px: 0.3,
            pitch_per_px: 0.2,
        }
    }
}

/// Look direction and magnification of the viewer.
///
/// `pitch` and `zoom` are clamped after every mutation. `yaw` is unbounded and
/// only normalised when the projection samples it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    yaw: f64,
    pitch: f64,
    zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            zoom: ZOOM_DEFAULT,
        }
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Yaw folded into [0, 360).
    pub fn normalized_yaw(&self) -> f64 {
        let y = self.yaw.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if y >= 360.0 {
            0.0
        } else {
            y
        }
    }

    pub fn apply_drag(&mut self, delta: DVec2, sensitivity: DragSensitivity) {
        self.yaw += delta.x * sensitivity.yaw_per_px;
        self.pitch = (self.pitch - delta.y * sensitivity.pitch_per_px).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Adds `delta` to zoom. Returns false when the request was absorbed at a bound.
    pub fn apply_zoom_delta(&mut self, delta: f64) -> bool {
        if !delta.is_finite() || delta == 0.0 {
            return false;
        }
        if (delta > 0.0 && !self.can_zoom_in()) || (delta < 0.0 && !self.can_zoom_out()) {
            return false;
        }
        // hundredths, so repeated 0.2 steps land exactly on the bounds
        let next = (((self.zoom + delta) * 100.0).round() / 100.0).clamp(ZOOM_MIN, ZOOM_MAX);
        if next == self.zoom {
            return false;
        }
        self.zoom = next;
        true
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom < ZOOM_MAX
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom > ZOOM_MIN
    }

    /// Auto-rotation step.
    pub fn rotate(&mut self, degrees: f64) {
        self.yaw += degrees;
    }

    /// Recentres the view: zoom 1, pitch 0, yaw 0.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_default(&self) -> bool {
        *self == Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn zoom_never_leaves_its_range() {
        let mut v = ViewState::new();
        let pattern = [0.2, 0.2, -0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2];
        for d in pattern.iter().cycle().take(200) {
            v.apply_zoom_delta(*d);
            assert!((ZOOM_MIN..=ZOOM_MAX).contains(&v.zoom()), "zoom {}", v.zoom());
        }
        for _ in 0..50 {
            v.apply_zoom_delta(-0.2);
            assert!((ZOOM_MIN..=ZOOM_MAX).contains(&v.zoom()));
        }
        assert_eq!(v.zoom(), ZOOM_MIN);
        assert!(!v.can_zoom_out());
    }

    #[test]
    fn zoom_steps_reach_the_ceiling_exactly() {
        let mut v = ViewState::new();
        for _ in 0..5 {
            assert!(v.apply_zoom_delta(0.2));
        }
        assert_eq!(v.zoom(), 2.0);
        for _ in 0..5 {
            assert!(v.apply_zoom_delta(0.2));
        }
        assert_eq!(v.zoom(), 3.0);
        assert!(!v.apply_zoom_delta(0.2));
        assert_eq!(v.zoom(), 3.0);
    }

    #[test]
    fn zoom_ignores_degenerate_deltas() {
        let mut v = ViewState::new();
        assert!(!v.apply_zoom_delta(0.0));
        assert!(!v.apply_zoom_delta(f64::NAN));
        assert_eq!(v.zoom(), ZOOM_DEFAULT);
    }

    #[test]
    fn steps_below_a_hundredth_do_not_move_zoom() {
        let mut v = ViewState::new();
        assert!(!v.apply_zoom_delta(0.004));
        assert!(!v.apply_zoom_delta(-0.004));
        assert_eq!(v.zoom(), ZOOM_DEFAULT);

        assert!(v.apply_zoom_delta(0.01));
        assert_eq!(v.zoom(), 1.01);
    }

    #[test]
    fn pitch_stays_clamped_under_drags() {
        let mut v = ViewState::new();
        let s = DragSensitivity::default();
        let deltas = [-500.0, 37.0, 1e6, -3.5, 0.0, -1e6, 120.0];
        for dy in deltas {
            v.apply_drag(DVec2::new(0.0, dy), s);
            assert!(v.pitch() >= -PITCH_LIMIT && v.pitch() <= PITCH_LIMIT);
        }
    }

    #[test]
    fn drag_moves_yaw_by_sensitivity() {
        let mut v = ViewState::new();
        v.apply_drag(DVec2::new(100.0, 0.0), DragSensitivity::default());
        assert!(approx(v.yaw(), 30.0));
        assert_eq!(v.pitch(), 0.0);

        // dragging down looks up
        v.apply_drag(DVec2::new(0.0, -50.0), DragSensitivity::default());
        assert!(approx(v.pitch(), 10.0));
    }

    #[test]
    fn yaw_normalises_into_a_full_turn() {
        let mut v = ViewState::new();
        v.rotate(725.0);
        assert!(approx(v.normalized_yaw(), 5.0));
        v.rotate(-730.0);
        assert!(approx(v.normalized_yaw(), 355.0));
        v.reset();
        v.rotate(-1e-18);
        assert!(v.normalized_yaw() < 360.0);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut v = ViewState::new();
        v.apply_drag(DVec2::new(40.0, 80.0), DragSensitivity::default());
        v.apply_zoom_delta(0.2);
        v.reset();
        let once = v;
        v.reset();
        assert_eq!(v, once);
        assert!(v.is_default());
    }
}
