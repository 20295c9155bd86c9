use egui::{Event, PointerButton, Pos2, TouchPhase};

use super::{ActiveTouch, EventType, MouseEvent, NativeEvent, Surface, TouchEvent};

impl Surface {
    /// Translate and dispatch every input event egui received this frame.
    ///
    /// Call once per frame, before the widgets that read element state.
    /// Touches this surface still tracks after egui reports none down are
    /// cancelled.
    pub fn process_egui_input(&self, ctx: &egui::Context) {
        let events = ctx.input(|i| i.events.clone());
        for event in &events {
            self.handle_egui_event(event);
        }
        if !self.state.borrow().touches.is_empty() && !ctx.input(|i| i.any_touches()) {
            self.cancel_touches();
        }
    }

    /// Dispatch a cancel for every touch still tracked and forget them.
    ///
    /// Tracked touches are only released by an end or cancel from the
    /// platform. Call this when the platform may have lost them, e.g. on
    /// focus loss, so they do not shadow the contacts of later gestures.
    pub fn cancel_touches(&self) {
        let stale = std::mem::take(&mut self.state.borrow_mut().touches);
        for (index, touch) in stale.iter().enumerate() {
            log::debug!("cancelling stale touch {}", touch.identifier);
            let event = TouchEvent {
                touches: stale[index + 1..].iter().map(ActiveTouch::touch).collect(),
                changed_touches: vec![touch.touch()],
                target: touch.target,
            };
            self.dispatch(EventType::TouchCancel, NativeEvent::Touch(event));
        }
    }

    /// Translate one egui event. Events without a native counterpart are
    /// ignored.
    pub fn handle_egui_event(&self, event: &Event) {
        match event {
            Event::Touch { id, phase, pos, .. } => self.handle_touch(id.0, *phase, *pos),
            Event::PointerButton {
                pos,
                button: PointerButton::Primary,
                pressed,
                ..
            } => {
                let kind = if *pressed {
                    EventType::MouseDown
                } else {
                    EventType::MouseUp
                };
                self.dispatch_mouse(kind, *pos);
            }
            Event::PointerMoved(pos) => self.dispatch_mouse(EventType::MouseMove, *pos),
            _ => {}
        }
    }

    fn dispatch_mouse(&self, kind: EventType, pos: Pos2) {
        let target = self.element_at(pos);
        self.dispatch(kind, NativeEvent::Mouse(MouseEvent { pos, target }));
    }

    fn handle_touch(&self, identifier: u64, phase: TouchPhase, pos: Pos2) {
        let (kind, event) = {
            let mut state = self.state.borrow_mut();
            let (kind, changed) = match phase {
                TouchPhase::Start => {
                    let touch = ActiveTouch {
                        identifier,
                        pos,
                        target: state.hit_test(pos),
                    };
                    state.touches.retain(|t| t.identifier != identifier);
                    state.touches.push(touch);
                    (EventType::TouchStart, touch)
                }
                TouchPhase::Move => {
                    let Some(touch) = state.touches.iter_mut().find(|t| t.identifier == identifier)
                    else {
                        log::trace!("move for unknown touch {}", identifier);
                        return;
                    };
                    touch.pos = pos;
                    (EventType::TouchMove, *touch)
                }
                TouchPhase::End | TouchPhase::Cancel => {
                    let Some(index) = state.touches.iter().position(|t| t.identifier == identifier)
                    else {
                        log::trace!("{:?} for unknown touch {}", phase, identifier);
                        return;
                    };
                    let mut touch = state.touches.remove(index);
                    touch.pos = pos;
                    let kind = if phase == TouchPhase::End {
                        EventType::TouchEnd
                    } else {
                        EventType::TouchCancel
                    };
                    (kind, touch)
                }
            };
            let event = TouchEvent {
                touches: state.touches.iter().map(ActiveTouch::touch).collect(),
                changed_touches: vec![changed.touch()],
                target: changed.target,
            };
            (kind, event)
        };
        self.dispatch(kind, NativeEvent::Touch(event));
    }
}
