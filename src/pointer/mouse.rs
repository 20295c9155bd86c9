use std::rc::Rc;

use super::{PointerEvent, PointerHandler, PointerHandlers, PointerSource};
use crate::surface::{Element, EventType, ListenerId, NativeEvent, Scope, Surface};

/// Mouse strategy.
///
/// Down is bound to the element, move and up to the window so a drag that
/// leaves the element keeps reporting.
pub struct MouseSource;

impl MouseSource {
    fn adapt(handler: &PointerHandler, released: bool) -> impl Fn(&NativeEvent) + 'static {
        let handler = Rc::clone(handler);
        move |event: &NativeEvent| {
            let NativeEvent::Mouse(mouse) = event else {
                return;
            };
            let contact_points = if released { Vec::new() } else { vec![mouse.pos] };
            handler(&PointerEvent {
                identifier: 0,
                contact_points,
                changed_contact_points: vec![mouse.pos],
            });
        }
    }
}

impl PointerSource for MouseSource {
    fn bind(&self, surface: &Surface, element: &Element, handlers: &PointerHandlers) -> Vec<ListenerId> {
        vec![
            surface.add_listener(
                Scope::Element(element.id()),
                EventType::MouseDown,
                Self::adapt(&handlers.on_start, false),
            ),
            surface.add_listener(
                Scope::Window,
                EventType::MouseMove,
                Self::adapt(&handlers.on_move, false),
            ),
            surface.add_listener(
                Scope::Window,
                EventType::MouseUp,
                Self::adapt(&handlers.on_end, true),
            ),
        ]
    }
}
