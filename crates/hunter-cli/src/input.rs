use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use hunter_core::config::polling;
use tracing::debug;

use crate::control::LoopControl;

/// Commands the watch loop accepts from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Toggle pausing of the poll loop.
    Pause,
    /// Refresh immediately.
    Refresh,
    Quit,
}

/// Spawn a thread posting key presses to `control`.
///
/// The thread ends once a quit has been posted, by a key or from elsewhere.
pub fn spawn_keyboard_monitor(control: Arc<LoopControl>) -> JoinHandle<()> {
    thread::spawn(move || {
        debug!("Keyboard monitor started");

        while !control.is_quit() {
            if event::poll(polling::INPUT_POLL).unwrap_or(false)
                && let Ok(Event::Key(key_event)) = event::read()
                && let Some(action) = key_action(&key_event)
            {
                debug!("Key {:?} -> {:?}", key_event.code, action);
                control.post(action);
            }
        }

        debug!("Keyboard monitor stopped");
    })
}

fn key_action(event: &KeyEvent) -> Option<KeyAction> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    match event.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(KeyAction::Quit),
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyAction::Quit)
        }
        KeyCode::Char('p') | KeyCode::Char('P') => Some(KeyAction::Pause),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(KeyAction::Refresh),
        _ => None,
    }
}
