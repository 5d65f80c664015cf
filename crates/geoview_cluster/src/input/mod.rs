//! # Input Handling
//!
//! Two event vocabularies meet here:
//!
//! - [`events`]: what the cluster framework delivers (channel pointer events,
//!   wheel, keys, each with the channel's viewport, frustum and head transform).
//! - [`queue`]: what camera manipulators consume (normalized pointer events
//!   with an input range, scroll motions and GUI keys).
//!
//! [`translator`] maps the former to the latter and applies the result to the
//! camera of a view.

pub mod events;
pub mod queue;
pub mod translator;

pub use events::{ConfigEvent, ConfigEventKind, EventContext, KeySym, PointerButtons};
pub use queue::{ButtonMask, EventQueue, GuiButton, GuiEvent, GuiEventKind, GuiKey, InputRange, ScrollMotion};
pub use translator::{logical_button, scroll_motion, translate_key, InputEventTranslator};
