/// Terminal input drain.
///
/// Every screen here reacts to discrete presses, so there is no held-key
/// tracking: each frame collects the Press/Repeat events that arrived since
/// the last one, in order.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub struct InputState {
    /// Key presses collected during the most recent drain_events() call.
    pub presses: Vec<KeyEvent>,

    /// The terminal was resized; the next frame must repaint fully.
    pub resized: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState { presses: Vec::with_capacity(8), resized: false }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        self.resized = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    // Release events only arrive with keyboard enhancement; ignore them.
                    if key.kind != KeyEventKind::Release {
                        self.presses.push(key);
                    }
                }
                Ok(Event::Resize(_, _)) => self.resized = true,
                _ => {}
            }
        }
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.presses.iter().any(is_ctrl_c)
    }
}

fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL)
        && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
}
