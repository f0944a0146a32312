// crates/tracker/src/focus.rs
//! Modal status surface with a keyboard focus trap.
//!
//! Presentation-framework agnostic: the surface tracks which of its
//! focusable elements holds input focus and wraps forward/backward
//! cycling inside that set, so focus cannot escape to background content
//! while the surface is up. The trap is held only while presented and is
//! released on every dismissal path.

use std::sync::Mutex;

/// Direction of a focus-cycling input (Tab / Shift-Tab equivalents).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Forward,
    Backward,
}

/// Focus state scoped to one presentation of the surface.
#[derive(Debug)]
struct FocusTrap {
    focusables: Vec<String>,
    focused: usize,
}

impl FocusTrap {
    fn new(focusables: Vec<String>) -> Self {
        Self {
            focusables,
            focused: 0,
        }
    }

    fn focused(&self) -> Option<&str> {
        self.focusables.get(self.focused).map(String::as_str)
    }

    fn cycle(&mut self, direction: CycleDirection) -> Option<&str> {
        if self.focusables.is_empty() {
            return None;
        }
        let last = self.focusables.len() - 1;
        self.focused = match direction {
            CycleDirection::Forward => {
                if self.focused >= last {
                    0
                } else {
                    self.focused + 1
                }
            }
            CycleDirection::Backward => {
                if self.focused == 0 {
                    last
                } else {
                    self.focused - 1
                }
            }
        };
        self.focused()
    }

    /// Replace the focusable set (the surface's buttons change with job
    /// status). Keeps the focused element when it survives, else snaps
    /// back to the first.
    fn set_focusables(&mut self, focusables: Vec<String>) {
        let kept = self
            .focused()
            .and_then(|cur| focusables.iter().position(|f| f == cur));
        self.focused = kept.unwrap_or(0);
        self.focusables = focusables;
    }
}

/// The modal status surface.
///
/// Owns presentation state plus the focus trap. Dismissal rules:
/// explicit dismissal ("Dismiss", "Run in background") is always
/// honored; dismissal by interacting outside the surface is honored only
/// while the tracked job is not running, so an active run cannot lose
/// its status view by a stray click.
pub struct StatusSurface {
    inner: Mutex<SurfaceState>,
    focusables: Vec<String>,
}

#[derive(Debug)]
struct SurfaceState {
    trap: Option<FocusTrap>,
}

impl StatusSurface {
    /// `focusables` is the surface's focus order when presented.
    pub fn new(focusables: Vec<String>) -> Self {
        Self {
            inner: Mutex::new(SurfaceState { trap: None }),
            focusables,
        }
    }

    /// Present the surface, moving focus to its first focusable element.
    /// Idempotent: re-presenting an open surface keeps its focus state.
    pub fn present(&self) {
        let mut state = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if state.trap.is_none() {
            state.trap = Some(FocusTrap::new(self.focusables.clone()));
        }
    }

    pub fn is_presented(&self) -> bool {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner).trap.is_some()
    }

    /// Explicit dismissal. Always honored; releases the focus trap.
    pub fn dismiss(&self) {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner).trap = None;
    }

    /// Dismissal from a click/tap outside the surface. Honored only when
    /// the tracked job is not running. Returns whether the surface closed.
    pub fn dismiss_from_outside(&self, job_running: bool) -> bool {
        if job_running {
            return false;
        }
        self.dismiss();
        true
    }

    /// Route a focus-cycling input into the trap. Returns the id of the
    /// newly focused element, or `None` when the surface is not presented
    /// (the input should fall through to the background content).
    pub fn cycle_focus(&self, direction: CycleDirection) -> Option<String> {
        let mut state = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state
            .trap
            .as_mut()
            .and_then(|trap| trap.cycle(direction).map(str::to_string))
    }

    /// Currently focused element id, if presented.
    pub fn focused(&self) -> Option<String> {
        let state = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state
            .trap
            .as_ref()
            .and_then(|trap| trap.focused().map(str::to_string))
    }

    /// Swap the focusable set while presented (e.g. the failed view shows
    /// retry/copy/dismiss instead of run-in-background). No-op when the
    /// surface is closed.
    pub fn set_focusables(&self, focusables: Vec<String>) {
        let mut state = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(trap) = state.trap.as_mut() {
            trap.set_focusables(focusables);
        }
    }
}
