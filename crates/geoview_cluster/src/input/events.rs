//! Framework-level input events

use crate::foundation::math::{Frustum, Mat4d, PixelViewport, Point3d};
use crate::view::ViewId;
use bitflags::bitflags;

bitflags! {
    /// Pointer buttons as reported by the framework
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PointerButtons: u32 {
        /// Primary button
        const BUTTON1 = 1 << 0;
        /// Secondary button
        const BUTTON2 = 1 << 1;
        /// Third button
        const BUTTON3 = 1 << 2;
        /// Fourth button
        const BUTTON4 = 1 << 3;
        /// Fifth button
        const BUTTON5 = 1 << 4;
    }
}

/// Framework key code: printable keys are their character, special keys start at 256
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySym(pub u32);

impl KeySym {
    /// Escape
    pub const ESCAPE: Self = Self(256);
    /// Backspace
    pub const BACKSPACE: Self = Self(257);
    /// Return
    pub const RETURN: Self = Self(258);
    /// Tab
    pub const TAB: Self = Self(259);
    /// Home
    pub const HOME: Self = Self(260);
    /// Cursor left
    pub const LEFT: Self = Self(261);
    /// Cursor up
    pub const UP: Self = Self(262);
    /// Cursor right
    pub const RIGHT: Self = Self(263);
    /// Cursor down
    pub const DOWN: Self = Self(264);
    /// Page up
    pub const PAGE_UP: Self = Self(265);
    /// Page down
    pub const PAGE_DOWN: Self = Self(266);
    /// End
    pub const END: Self = Self(267);
    /// F1; F2..F12 follow consecutively
    pub const F1: Self = Self(268);

    /// Key for a printable character.
    ///
    /// Characters from U+0100 on have no key code; their codes would collide
    /// with the special keys.
    pub const fn from_char(c: char) -> Option<Self> {
        let code = c as u32;
        if code < 256 {
            Some(Self(code))
        } else {
            None
        }
    }

    /// The character, if this is a printable key
    pub fn as_char(self) -> Option<char> {
        if self.0 < 256 {
            char::from_u32(self.0)
        } else {
            None
        }
    }
}

/// Rendering context of the channel that produced an event
#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    /// View the channel renders
    pub view_id: ViewId,
    /// Channel pixel viewport
    pub pvp: PixelViewport,
    /// Channel frustum
    pub frustum: Frustum,
    /// Head transform of the observer
    pub head_transform: Mat4d,
}

impl EventContext {
    /// Context for a view with an identity head transform
    pub fn new(view_id: ViewId, pvp: PixelViewport, frustum: Frustum) -> Self {
        Self {
            view_id,
            pvp,
            frustum,
            head_transform: Mat4d::identity(),
        }
    }
}

/// Kind and payload of a framework event
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigEventKind {
    /// Wheel turned
    PointerWheel {
        /// Horizontal axis delta
        x_axis: i32,
        /// Vertical axis delta
        y_axis: i32,
    },
    /// Pointer moved inside a channel
    PointerMotion {
        /// Pointer x in channel pixels
        x: u32,
        /// Pointer y in channel pixels
        y: u32,
    },
    /// Pointer button pressed inside a channel
    PointerButtonPress {
        /// Pointer x in channel pixels
        x: u32,
        /// Pointer y in channel pixels
        y: u32,
        /// Button that changed
        button: PointerButtons,
    },
    /// Pointer button released inside a channel
    PointerButtonRelease {
        /// Pointer x in channel pixels
        x: u32,
        /// Pointer y in channel pixels
        y: u32,
        /// Button that changed
        button: PointerButtons,
    },
    /// Key pressed
    KeyPress(KeySym),
    /// Key released
    KeyRelease(KeySym),
    /// A rendering process reports a pick result
    Intersection {
        /// World-space hit point
        hit: Point3d,
        /// Node that computed the hit
        originator: u32,
    },
    /// Anything else; left to the framework
    Other(u32),
}

/// Event delivered to the coordinating process
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEvent {
    /// What happened
    pub kind: ConfigEventKind,
    /// Where it happened
    pub context: EventContext,
}

impl ConfigEvent {
    /// Create an event
    pub fn new(kind: ConfigEventKind, context: EventContext) -> Self {
        Self { kind, context }
    }

    /// Whether this is one of the pointer kinds handled per view
    pub fn is_pointer(&self) -> bool {
        matches!(
            self.kind,
            ConfigEventKind::PointerWheel { .. }
                | ConfigEventKind::PointerMotion { .. }
                | ConfigEventKind::PointerButtonPress { .. }
                | ConfigEventKind::PointerButtonRelease { .. }
        )
    }
}
