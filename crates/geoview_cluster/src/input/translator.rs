//! Translation of framework events into manipulator events

use super::events::{ConfigEvent, ConfigEventKind, EventContext, KeySym, PointerButtons};
use super::queue::{EventQueue, GuiButton, GuiKey, ScrollMotion};
use crate::foundation::math::PixelViewport;
use crate::render::{ContextBinding, PlaceholderContext, ViewInstance};
use crate::view::View;

/// Scroll direction of a wheel event; the horizontal axis wins
pub fn scroll_motion(x_axis: i32, y_axis: i32) -> ScrollMotion {
    if x_axis > 0 {
        ScrollMotion::Up
    } else if x_axis < 0 {
        ScrollMotion::Down
    } else if y_axis > 0 {
        ScrollMotion::Right
    } else if y_axis < 0 {
        ScrollMotion::Left
    } else {
        ScrollMotion::None
    }
}

/// Logical 1-based index of the lowest button in `buttons`
pub fn logical_button(buttons: PointerButtons) -> Option<u32> {
    if buttons.is_empty() {
        None
    } else {
        Some(buttons.bits().trailing_zeros() + 1)
    }
}

/// GUI key for a framework key symbol
pub fn translate_key(key: KeySym) -> GuiKey {
    if let Some(c) = key.as_char() {
        return match c {
            '\u{1b}' => GuiKey::Escape,
            '\u{8}' => GuiKey::BackSpace,
            '\r' | '\n' => GuiKey::Return,
            '\t' => GuiKey::Tab,
            _ => GuiKey::Char(c),
        };
    }
    match key {
        KeySym::ESCAPE => GuiKey::Escape,
        KeySym::BACKSPACE => GuiKey::BackSpace,
        KeySym::RETURN => GuiKey::Return,
        KeySym::TAB => GuiKey::Tab,
        KeySym::HOME => GuiKey::Home,
        KeySym::LEFT => GuiKey::Left,
        KeySym::UP => GuiKey::Up,
        KeySym::RIGHT => GuiKey::Right,
        KeySym::DOWN => GuiKey::Down,
        KeySym::PAGE_UP => GuiKey::PageUp,
        KeySym::PAGE_DOWN => GuiKey::PageDown,
        KeySym::END => GuiKey::End,
        KeySym(code) if (KeySym::F1.0..KeySym::F1.0 + 12).contains(&code) => {
            u8::try_from(code - KeySym::F1.0 + 1).map_or(GuiKey::Unknown(code), GuiKey::F)
        }
        KeySym(code) => GuiKey::Unknown(code),
    }
}

/// Feeds framework input into a view's event queue and applies it to the
/// view's manipulator.
///
/// Owns the placeholder context cameras are bound to while an event is
/// applied.
#[derive(Debug, Default)]
pub struct InputEventTranslator {
    placeholder: PlaceholderContext,
}

impl InputEventTranslator {
    /// Create a translator with a zero-size placeholder
    pub fn new() -> Self {
        Self::default()
    }

    /// The placeholder context
    pub fn placeholder(&self) -> &PlaceholderContext {
        &self.placeholder
    }

    /// Queue a pointer event; returns whether anything was queued.
    ///
    /// Pointer positions are reported in channel pixels, so the input range
    /// follows the event's viewport. Buttons beyond the third are ignored.
    pub fn enqueue_pointer(queue: &mut EventQueue, event: &ConfigEvent, time: f64) -> bool {
        let pvp = event.context.pvp;
        let set_range = |queue: &mut EventQueue| {
            queue.set_mouse_input_range(0.0, 0.0, f64::from(pvp.w), f64::from(pvp.h));
        };

        match event.kind {
            ConfigEventKind::PointerWheel { x_axis, y_axis } => {
                queue.mouse_scroll(scroll_motion(x_axis, y_axis), time);
                true
            }
            ConfigEventKind::PointerMotion { x, y } => {
                set_range(queue);
                queue.mouse_motion(f64::from(x), f64::from(y), time);
                true
            }
            ConfigEventKind::PointerButtonPress { x, y, button } => {
                let Some(button) = logical_button(button).and_then(GuiButton::from_index) else {
                    return false;
                };
                set_range(queue);
                queue.mouse_button_press(f64::from(x), f64::from(y), button, time);
                true
            }
            ConfigEventKind::PointerButtonRelease { x, y, button } => {
                let Some(button) = logical_button(button).and_then(GuiButton::from_index) else {
                    return false;
                };
                set_range(queue);
                queue.mouse_button_release(f64::from(x), f64::from(y), button, time);
                true
            }
            _ => false,
        }
    }

    /// Queue a key press
    pub fn enqueue_key_press(queue: &mut EventQueue, key: KeySym, time: f64) {
        queue.key_press(translate_key(key), time);
    }

    /// Queue a key release
    pub fn enqueue_key_release(queue: &mut EventQueue, key: KeySym, time: f64) {
        queue.key_release(translate_key(key), time);
    }

    /// Apply every queued event of `instance` to its manipulator.
    ///
    /// For each event the camera is bound to the placeholder with the
    /// channel's viewport, a projection from the channel frustum clipped to
    /// the view's near/far, and the head transform applied to the view
    /// matrix. The camera is left unbound afterwards. Returns the number of
    /// events applied; without a manipulator the queue is just emptied.
    pub fn drain(&mut self, instance: &mut ViewInstance, view: &View, context: &EventContext) -> usize {
        let events = instance.event_queue.take_events();
        let ViewInstance { camera, manipulator, .. } = instance;
        let Some(manipulator) = manipulator.as_mut() else {
            return 0;
        };

        let pvp = context.pvp;
        let (near, far) = view.near_far();
        let mut frustum = context.frustum;
        frustum.adjust_near(near);
        frustum.far = far;
        let view_matrix = context.head_transform * view.view_matrix();

        for event in &events {
            self.placeholder.set_pixel_viewport(pvp.w, pvp.h);
            camera.set_graphics_context(Some(ContextBinding::Placeholder));
            self.placeholder.attach_camera();

            camera.set_viewport(Some(PixelViewport::sized(pvp.w, pvp.h)));
            camera.set_projection_as_frustum(&frustum);
            camera.set_view_matrix(view_matrix);

            manipulator.handle(event, camera);

            self.placeholder.clear_cameras();
            camera.unbind();
        }
        events.len()
    }
}
