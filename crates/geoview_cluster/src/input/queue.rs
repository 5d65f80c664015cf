//! Manipulator-level events and the per-view event queue

use bitflags::bitflags;
use std::collections::VecDeque;

/// Direction of a wheel step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMotion {
    /// No direction
    None,
    /// Away from the user
    Up,
    /// Towards the user
    Down,
    /// Tilted left
    Left,
    /// Tilted right
    Right,
}

/// The three logical buttons manipulators understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuiButton {
    /// Logical button 1
    Left,
    /// Logical button 2
    Middle,
    /// Logical button 3
    Right,
}

impl GuiButton {
    /// Button for a logical index; only 1..=3 exist
    pub const fn from_index(index: u32) -> Option<Self> {
        match index {
            1 => Some(Self::Left),
            2 => Some(Self::Middle),
            3 => Some(Self::Right),
            _ => None,
        }
    }

    /// Held-button flag of this button
    pub const fn mask(self) -> ButtonMask {
        match self {
            Self::Left => ButtonMask::LEFT,
            Self::Middle => ButtonMask::MIDDLE,
            Self::Right => ButtonMask::RIGHT,
        }
    }
}

bitflags! {
    /// Buttons held while an event happened
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ButtonMask: u8 {
        /// Left button held
        const LEFT = 1 << 0;
        /// Middle button held
        const MIDDLE = 1 << 1;
        /// Right button held
        const RIGHT = 1 << 2;
    }
}

/// Key as seen by manipulators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuiKey {
    /// Printable character
    Char(char),
    /// Escape
    Escape,
    /// Backspace
    BackSpace,
    /// Return
    Return,
    /// Tab
    Tab,
    /// Home
    Home,
    /// End
    End,
    /// Page up
    PageUp,
    /// Page down
    PageDown,
    /// Cursor left
    Left,
    /// Cursor up
    Up,
    /// Cursor right
    Right,
    /// Cursor down
    Down,
    /// Function key F1..F12
    F(u8),
    /// Unmapped framework key code
    Unknown(u32),
}

/// Coordinate range pointer positions are reported in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputRange {
    /// Minimum x
    pub x_min: f64,
    /// Minimum y
    pub y_min: f64,
    /// Maximum x
    pub x_max: f64,
    /// Maximum y
    pub y_max: f64,
}

impl Default for InputRange {
    fn default() -> Self {
        Self { x_min: -1.0, y_min: -1.0, x_max: 1.0, y_max: 1.0 }
    }
}

/// What a manipulator event describes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuiEventKind {
    /// Wheel step
    Scroll(ScrollMotion),
    /// Pointer moved with no button held
    Move,
    /// Pointer moved with a button held
    Drag,
    /// Button pressed
    Push(GuiButton),
    /// Button released
    Release(GuiButton),
    /// Key pressed
    KeyDown(GuiKey),
    /// Key released
    KeyUp(GuiKey),
}

/// Event consumed by camera manipulators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuiEvent {
    /// What happened
    pub kind: GuiEventKind,
    /// Pointer x in input-range coordinates
    pub x: f64,
    /// Pointer y in input-range coordinates
    pub y: f64,
    /// Range `x` and `y` are expressed in
    pub range: InputRange,
    /// Buttons held after the event
    pub buttons: ButtonMask,
    /// Event time in seconds
    pub time: f64,
}

impl GuiEvent {
    /// Pointer x mapped to [-1, 1]
    pub fn x_normalized(&self) -> f64 {
        let width = self.range.x_max - self.range.x_min;
        if width == 0.0 {
            return 0.0;
        }
        2.0 * (self.x - self.range.x_min) / width - 1.0
    }

    /// Pointer y mapped to [-1, 1], growing upwards
    pub fn y_normalized(&self) -> f64 {
        let height = self.range.y_max - self.range.y_min;
        if height == 0.0 {
            return 0.0;
        }
        -(2.0 * (self.y - self.range.y_min) / height - 1.0)
    }
}

/// Accumulates manipulator events for one view.
///
/// Tracks the input range and the held buttons so pointer motion can be told
/// apart from dragging.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<GuiEvent>,
    range: InputRange,
    buttons: ButtonMask,
    x: f64,
    y: f64,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the coordinate range of subsequent pointer events
    pub fn set_mouse_input_range(&mut self, x_min: f64, y_min: f64, x_max: f64, y_max: f64) {
        self.range = InputRange { x_min, y_min, x_max, y_max };
    }

    /// Current input range
    pub fn input_range(&self) -> InputRange {
        self.range
    }

    /// Buttons currently held
    pub fn buttons(&self) -> ButtonMask {
        self.buttons
    }

    fn push(&mut self, kind: GuiEventKind, time: f64) {
        self.events.push_back(GuiEvent {
            kind,
            x: self.x,
            y: self.y,
            range: self.range,
            buttons: self.buttons,
            time,
        });
    }

    /// Wheel step at the last pointer position
    pub fn mouse_scroll(&mut self, motion: ScrollMotion, time: f64) {
        self.push(GuiEventKind::Scroll(motion), time);
    }

    /// Pointer motion; becomes a drag while a button is held
    pub fn mouse_motion(&mut self, x: f64, y: f64, time: f64) {
        self.x = x;
        self.y = y;
        let kind = if self.buttons.is_empty() { GuiEventKind::Move } else { GuiEventKind::Drag };
        self.push(kind, time);
    }

    /// Button press at a position
    pub fn mouse_button_press(&mut self, x: f64, y: f64, button: GuiButton, time: f64) {
        self.x = x;
        self.y = y;
        self.buttons.insert(button.mask());
        self.push(GuiEventKind::Push(button), time);
    }

    /// Button release at a position
    pub fn mouse_button_release(&mut self, x: f64, y: f64, button: GuiButton, time: f64) {
        self.x = x;
        self.y = y;
        self.buttons.remove(button.mask());
        self.push(GuiEventKind::Release(button), time);
    }

    /// Key press
    pub fn key_press(&mut self, key: GuiKey, time: f64) {
        self.push(GuiEventKind::KeyDown(key), time);
    }

    /// Key release
    pub fn key_release(&mut self, key: GuiKey, time: f64) {
        self.push(GuiEventKind::KeyUp(key), time);
    }

    /// Remove and return all queued events, oldest first
    pub fn take_events(&mut self) -> Vec<GuiEvent> {
        self.events.drain(..).collect()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_becomes_drag_while_held() {
        let mut queue = EventQueue::new();
        queue.set_mouse_input_range(0.0, 0.0, 100.0, 100.0);

        queue.mouse_motion(10.0, 10.0, 0.0);
        queue.mouse_button_press(10.0, 10.0, GuiButton::Left, 0.1);
        queue.mouse_motion(20.0, 10.0, 0.2);
        queue.mouse_button_release(20.0, 10.0, GuiButton::Left, 0.3);
        queue.mouse_motion(30.0, 10.0, 0.4);

        let kinds: Vec<_> = queue.take_events().into_iter().map(|event| event.kind).collect();
        assert_eq!(
            kinds,
            vec![
                GuiEventKind::Move,
                GuiEventKind::Push(GuiButton::Left),
                GuiEventKind::Drag,
                GuiEventKind::Release(GuiButton::Left),
                GuiEventKind::Move,
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_normalized_coordinates() {
        let mut queue = EventQueue::new();
        queue.set_mouse_input_range(0.0, 0.0, 200.0, 100.0);
        queue.mouse_motion(200.0, 0.0, 0.0);

        let event = queue.take_events()[0];
        assert!((event.x_normalized() - 1.0).abs() < 1e-12);
        assert!((event.y_normalized() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_logical_button_indices() {
        assert_eq!(GuiButton::from_index(1), Some(GuiButton::Left));
        assert_eq!(GuiButton::from_index(3), Some(GuiButton::Right));
        assert_eq!(GuiButton::from_index(0), None);
        assert_eq!(GuiButton::from_index(4), None);
    }
}
