//! Per-tick input snapshot.
//!
//! The engine feeds key events in as they arrive; the session reads the
//! snapshot once per tick and then calls [`InputState::end_tick`], so a key
//! tapped between two ticks still registers as one press.

use ahash::AHashMap;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Number of hotbar slots.
pub const HOTBAR_SLOTS: usize = 9;

/// Game actions that can be bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Move up
    MoveUp,
    /// Move down
    MoveDown,
    /// Move left
    MoveLeft,
    /// Move right
    MoveRight,
    /// Use the tile being looked at
    Interact,
    /// Break the tile being looked at
    Break,
    /// Place the selected item
    Place,
    /// Toggle the debug overlay
    ToggleDebug,
}

/// State of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    /// Whether the button is currently held down
    pub pressed: bool,
    /// Whether the button went down since the last tick
    pub just_pressed: bool,
}

impl ButtonState {
    /// Records a key-down event. Key repeat does not re-trigger.
    pub fn press(&mut self) {
        if !self.pressed {
            self.just_pressed = true;
        }
        self.pressed = true;
    }

    /// Records a key-up event.
    pub fn release(&mut self) {
        self.pressed = false;
    }

    /// Clears the per-tick edge.
    pub fn clear_tick(&mut self) {
        self.just_pressed = false;
    }
}

/// Input polled by the session once per tick.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    buttons: AHashMap<Action, ButtonState>,
    hotbar: Option<usize>,
}

impl InputState {
    /// Creates an empty input state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the state of an action's button.
    pub fn set(&mut self, action: Action, pressed: bool) {
        let button = self.buttons.entry(action).or_default();
        if pressed {
            button.press();
        } else {
            button.release();
        }
    }

    /// Requests a hotbar slot. Out-of-range slots are ignored.
    pub fn select_hotbar(&mut self, slot: usize) {
        if slot < HOTBAR_SLOTS {
            self.hotbar = Some(slot);
        }
    }

    /// Whether an action is held.
    #[must_use]
    pub fn pressed(&self, action: Action) -> bool {
        self.buttons.get(&action).is_some_and(|b| b.pressed)
    }

    /// Whether an action was triggered since the last tick.
    #[must_use]
    pub fn just_pressed(&self, action: Action) -> bool {
        self.buttons.get(&action).is_some_and(|b| b.just_pressed)
    }

    /// Hotbar slot requested since the last tick.
    #[must_use]
    pub const fn hotbar(&self) -> Option<usize> {
        self.hotbar
    }

    /// Movement direction, each axis in `{-1, 0, 1}`.
    #[must_use]
    pub fn movement(&self) -> Vec2 {
        let axis = |negative, positive| match (self.pressed(negative), self.pressed(positive)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        Vec2::new(
            axis(Action::MoveLeft, Action::MoveRight),
            axis(Action::MoveUp, Action::MoveDown),
        )
    }

    /// Clears per-tick state.
    pub fn end_tick(&mut self) {
        for button in self.buttons.values_mut() {
            button.clear_tick();
        }
        self.hotbar = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_between_ticks_registers_once() {
        let mut input = InputState::new();
        input.set(Action::Interact, true);
        input.set(Action::Interact, false);
        assert!(input.just_pressed(Action::Interact));
        assert!(!input.pressed(Action::Interact));

        input.end_tick();
        assert!(!input.just_pressed(Action::Interact));
    }

    #[test]
    fn test_held_key_does_not_repeat() {
        let mut input = InputState::new();
        input.set(Action::Break, true);
        input.end_tick();
        input.set(Action::Break, true);
        assert!(!input.just_pressed(Action::Break));
        assert!(input.pressed(Action::Break));
    }

    #[test]
    fn test_movement_cancels_opposites() {
        let mut input = InputState::new();
        input.set(Action::MoveLeft, true);
        input.set(Action::MoveDown, true);
        assert_eq!(input.movement(), Vec2::new(-1.0, 1.0));

        input.set(Action::MoveRight, true);
        assert_eq!(input.movement(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_hotbar_selection_is_bounded() {
        let mut input = InputState::new();
        input.select_hotbar(HOTBAR_SLOTS);
        assert_eq!(input.hotbar(), None);
        input.select_hotbar(3);
        assert_eq!(input.hotbar(), Some(3));
        input.end_tick();
        assert_eq!(input.hotbar(), None);
    }
}
