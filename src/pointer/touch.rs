use std::rc::Rc;

use super::{PointerEvent, PointerHandler, PointerHandlers, PointerSource};
use crate::surface::{Element, EventType, ListenerId, NativeEvent, Scope, Surface};

/// Native touch strategy. Start and cancel are bound to the element, move and
/// end to the window.
pub struct TouchSource;

impl TouchSource {
    fn adapt(handler: &PointerHandler) -> impl Fn(&NativeEvent) + 'static {
        let handler = Rc::clone(handler);
        move |event: &NativeEvent| {
            let NativeEvent::Touch(touch) = event else {
                return;
            };
            handler(&PointerEvent {
                identifier: touch
                    .changed_touches
                    .first()
                    .map(|t| t.identifier)
                    .unwrap_or_default(),
                contact_points: touch.touches.iter().map(|t| t.pos).collect(),
                changed_contact_points: touch.changed_touches.iter().map(|t| t.pos).collect(),
            });
        }
    }
}

impl PointerSource for TouchSource {
    fn bind(&self, surface: &Surface, element: &Element, handlers: &PointerHandlers) -> Vec<ListenerId> {
        let own = Scope::Element(element.id());
        vec![
            surface.add_listener(own, EventType::TouchStart, Self::adapt(&handlers.on_start)),
            surface.add_listener(Scope::Window, EventType::TouchMove, Self::adapt(&handlers.on_move)),
            surface.add_listener(Scope::Window, EventType::TouchEnd, Self::adapt(&handlers.on_end)),
            surface.add_listener(own, EventType::TouchCancel, Self::adapt(&handlers.on_cancel)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::super::attach;
    use super::super::tests::recording_handlers;
    use crate::surface::{Capabilities, Surface};
    use egui::{pos2, Event, Modifiers, PointerButton, Pos2, Rect, TouchDeviceId, TouchId, TouchPhase};

    fn touch(id: u64, phase: TouchPhase, pos: Pos2) -> Event {
        Event::Touch {
            device_id: TouchDeviceId(0),
            id: TouchId(id),
            phase,
            pos,
            force: None,
        }
    }

    #[test]
    fn forwards_all_four_phases() {
        let surface = Surface::with_capabilities(Capabilities::touch());
        let el = surface.create_element(Rect::from_min_max(pos2(0., 0.), pos2(10., 10.)));
        let (handlers, log) = recording_handlers();
        let _binding = attach(&el, handlers);

        surface.handle_egui_event(&touch(4, TouchPhase::Start, pos2(5., 5.)));
        surface.handle_egui_event(&touch(4, TouchPhase::Move, pos2(9., 6.)));
        surface.handle_egui_event(&touch(4, TouchPhase::End, pos2(9., 6.)));
        surface.handle_egui_event(&touch(5, TouchPhase::Start, pos2(5., 5.)));
        surface.handle_egui_event(&touch(5, TouchPhase::Cancel, pos2(5., 5.)));

        let log = log.borrow();
        let phases: Vec<_> = log.iter().map(|(p, _)| *p).collect();
        assert_eq!(phases, vec!["start", "move", "end", "start", "cancel"]);
        assert_eq!(log[0].1.identifier, 4);
        assert_eq!(log[1].1.contact_points, vec![pos2(9., 6.)]);
        assert!(log[2].1.contact_points.is_empty());
        assert_eq!(log[4].1.identifier, 5);
    }

    #[test]
    fn mouse_events_are_ignored_in_touch_mode() {
        let surface = Surface::with_capabilities(Capabilities::touch());
        let el = surface.create_element(Rect::from_min_max(pos2(0., 0.), pos2(10., 10.)));
        let (handlers, log) = recording_handlers();
        let _binding = attach(&el, handlers);

        surface.handle_egui_event(&Event::PointerButton {
            pos: pos2(5., 5.),
            button: PointerButton::Primary,
            pressed: true,
            modifiers: Modifiers::default(),
        });
        surface.handle_egui_event(&Event::PointerMoved(pos2(6., 6.)));
        assert!(log.borrow().is_empty());
    }
}
