/// Keyboard input for the quiz.
///
/// Every action is a one-shot: pick an option, move the cursor, restart,
/// toggle theme, quit. Only Press events count; Repeat and Release are
/// dropped so holding a key never answers twice.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Number keys and letters that pick an option slot directly.
const SLOT_KEYS: [[char; 3]; 4] = [
    ['1', 'a', 'A'],
    ['2', 'b', 'B'],
    ['3', 'c', 'C'],
    ['4', 'd', 'D'],
];

pub struct InputState {
    /// Keys pressed during the most recent `drain_events()` call.
    presses: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per frame before handling actions.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.push(key);
            }
        }
    }

    fn push(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Press {
            self.presses.push(key);
        }
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.presses.iter().any(|k| k.code == code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.presses.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    /// Option slot chosen by number or letter this frame, first press wins.
    pub fn slot_pressed(&self) -> Option<usize> {
        self.presses
            .iter()
            .filter(|k| !k.modifiers.contains(KeyModifiers::CONTROL))
            .find_map(|k| match k.code {
                KeyCode::Char(c) => SLOT_KEYS.iter().position(|keys| keys.contains(&c)),
                _ => None,
            })
    }
}
