//! Keyboard handling.
//!
//! Bridges winit key events to the gameplay input snapshot. Engine-level
//! shortcuts are published on the event bus instead.

use atoll_gameplay::input::{Action, InputState};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::events::{EngineEvent, EventPublisher};

/// Gameplay action bound to a key.
fn action_for(key: KeyCode) -> Option<Action> {
    Some(match key {
        KeyCode::KeyW | KeyCode::ArrowUp => Action::MoveUp,
        KeyCode::KeyS | KeyCode::ArrowDown => Action::MoveDown,
        KeyCode::KeyA | KeyCode::ArrowLeft => Action::MoveLeft,
        KeyCode::KeyD | KeyCode::ArrowRight => Action::MoveRight,
        KeyCode::KeyE => Action::Interact,
        KeyCode::KeyQ => Action::Break,
        KeyCode::KeyF => Action::Place,
        KeyCode::F3 => Action::ToggleDebug,
        _ => return None,
    })
}

/// Hotbar slot selected by a number key.
fn hotbar_slot(key: KeyCode) -> Option<usize> {
    Some(match key {
        KeyCode::Digit1 => 0,
        KeyCode::Digit2 => 1,
        KeyCode::Digit3 => 2,
        KeyCode::Digit4 => 3,
        KeyCode::Digit5 => 4,
        KeyCode::Digit6 => 5,
        KeyCode::Digit7 => 6,
        KeyCode::Digit8 => 7,
        KeyCode::Digit9 => 8,
        _ => return None,
    })
}

/// Turns window events into the per-tick input snapshot.
#[derive(Debug)]
pub struct InputHandler {
    state: InputState,
    ctrl: bool,
    events: EventPublisher,
}

impl InputHandler {
    /// Creates a handler publishing shortcuts to `events`.
    #[must_use]
    pub fn new(events: EventPublisher) -> Self {
        Self {
            state: InputState::new(),
            ctrl: false,
            events,
        }
    }

    /// Handles a window event. Returns true if it was a keyboard event.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.key(key, event.state == ElementState::Pressed, event.repeat);
                }
                true
            },
            WindowEvent::ModifiersChanged(modifiers) => {
                self.ctrl = modifiers.state().control_key();
                true
            },
            WindowEvent::Focused(false) => {
                // Keys released while unfocused never arrive.
                self.release_all();
                false
            },
            _ => false,
        }
    }

    /// Applies one key transition.
    pub fn key(&mut self, key: KeyCode, pressed: bool, repeat: bool) {
        if pressed && !repeat {
            match key {
                KeyCode::F5 if self.ctrl => self.events.publish(EngineEvent::Reload),
                KeyCode::F5 => self.events.publish(EngineEvent::Save),
                _ => {},
            }
            if let Some(slot) = hotbar_slot(key) {
                self.state.select_hotbar(slot);
            }
        }
        if let Some(action) = action_for(key) {
            self.state.set(action, pressed);
        }
    }

    fn release_all(&mut self) {
        for action in [
            Action::MoveUp,
            Action::MoveDown,
            Action::MoveLeft,
            Action::MoveRight,
            Action::Interact,
            Action::Break,
            Action::Place,
            Action::ToggleDebug,
        ] {
            self.state.set(action, false);
        }
        self.ctrl = false;
    }

    /// Snapshot for the next tick.
    #[must_use]
    pub const fn state(&self) -> &InputState {
        &self.state
    }

    /// Clears per-tick edges after a tick has consumed them.
    pub fn end_tick(&mut self) {
        self.state.end_tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;

    #[test]
    fn test_key_bindings() {
        assert_eq!(action_for(KeyCode::KeyW), Some(Action::MoveUp));
        assert_eq!(action_for(KeyCode::ArrowLeft), Some(Action::MoveLeft));
        assert_eq!(action_for(KeyCode::KeyE), Some(Action::Interact));
        assert_eq!(action_for(KeyCode::KeyQ), Some(Action::Break));
        assert_eq!(action_for(KeyCode::KeyF), Some(Action::Place));
        assert_eq!(action_for(KeyCode::Space), None);
        assert_eq!(hotbar_slot(KeyCode::Digit1), Some(0));
        assert_eq!(hotbar_slot(KeyCode::Digit9), Some(8));
        assert_eq!(hotbar_slot(KeyCode::Digit0), None);
    }

    #[test]
    fn test_keys_reach_snapshot() {
        let bus = EventBus::new();
        let mut handler = InputHandler::new(bus.publisher());
        handler.key(KeyCode::KeyD, true, false);
        handler.key(KeyCode::Digit4, true, false);
        assert!(handler.state().pressed(Action::MoveRight));
        assert_eq!(handler.state().hotbar(), Some(3));

        handler.end_tick();
        handler.key(KeyCode::KeyD, false, false);
        assert!(!handler.state().pressed(Action::MoveRight));
        assert_eq!(handler.state().hotbar(), None);
    }

    #[test]
    fn test_function_keys_publish() {
        let bus = EventBus::new();
        let mut handler = InputHandler::new(bus.publisher());
        handler.key(KeyCode::F5, true, false);
        handler.ctrl = true;
        handler.key(KeyCode::F5, true, false);
        handler.key(KeyCode::F5, true, true);
        assert_eq!(bus.drain(), vec![EngineEvent::Save, EngineEvent::Reload]);
    }

    #[test]
    fn test_focus_loss_releases_keys() {
        let bus = EventBus::new();
        let mut handler = InputHandler::new(bus.publisher());
        handler.key(KeyCode::KeyW, true, false);
        handler.handle_event(&WindowEvent::Focused(false));
        assert!(!handler.state().pressed(Action::MoveUp));
    }
}
