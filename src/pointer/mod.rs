//! One four-phase pointer stream over touch and mouse input.
//!
//! [`attach`] picks a strategy once, from the capabilities of the element's
//! surface: native touch events when the platform has them, mouse events
//! otherwise. Either way the handlers receive a [`PointerEvent`].

use egui::Pos2;
use std::rc::Rc;

use crate::surface::{Capabilities, Element, ListenerId, Surface};

mod mouse;
mod touch;

pub use mouse::MouseSource;
pub use touch::TouchSource;

/// Pointer input normalized across device classes.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    /// Identifier of the contact that changed, always 0 for a mouse
    pub identifier: u64,
    /// Contacts currently down, first one is authoritative
    pub contact_points: Vec<Pos2>,
    /// Contacts that changed in this event
    pub changed_contact_points: Vec<Pos2>,
}

impl PointerEvent {
    /// The authoritative contact point, if any contact is down.
    pub fn primary(&self) -> Option<Pos2> {
        self.contact_points.first().copied()
    }
}

/// Shared pointer callback.
pub type PointerHandler = Rc<dyn Fn(&PointerEvent)>;

/// The four phases a [`PointerSource`] reports.
#[derive(Clone)]
pub struct PointerHandlers {
    /// A contact went down on the element
    pub on_start: PointerHandler,
    /// The contact moved, anywhere on the surface
    pub on_move: PointerHandler,
    /// The contact was released, anywhere on the surface
    pub on_end: PointerHandler,
    /// Never invoked by the mouse strategy
    pub on_cancel: PointerHandler,
}

/// A way of turning native events into [`PointerEvent`]s.
pub trait PointerSource {
    /// Bind listeners for `element` on `surface`, returning their ids.
    fn bind(&self, surface: &Surface, element: &Element, handlers: &PointerHandlers) -> Vec<ListenerId>;
}

/// The strategy matching `capabilities`.
pub fn source_for(capabilities: Capabilities) -> Box<dyn PointerSource> {
    if capabilities.touch {
        Box::new(TouchSource)
    } else {
        Box::new(MouseSource)
    }
}

/// Bind `handlers` to pointer input on `element`.
///
/// The binding stays active until [`PointerBinding::detach`] is called;
/// dropping the binding does not unbind.
pub fn attach(element: &Element, handlers: PointerHandlers) -> PointerBinding {
    let Some(surface) = element.surface() else {
        log::warn!("{:?} has no surface, pointer input not bound", element);
        return PointerBinding {
            surface: None,
            listeners: Vec::new(),
        };
    };
    let source = source_for(surface.capabilities());
    let listeners = source.bind(&surface, element, &handlers);
    log::trace!("bound {} pointer listeners for {:?}", listeners.len(), element);
    PointerBinding {
        surface: Some(surface),
        listeners,
    }
}

/// Listeners bound by [`attach`].
#[derive(Debug)]
pub struct PointerBinding {
    surface: Option<Surface>,
    listeners: Vec<ListenerId>,
}

impl PointerBinding {
    /// Unbind exactly the listeners bound by [`attach`]. Later calls do nothing.
    pub fn detach(&mut self) {
        if let Some(surface) = self.surface.take() {
            for id in self.listeners.drain(..) {
                surface.remove_listener(id);
            }
        }
    }

    /// Whether [`PointerBinding::detach`] has yet to run.
    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Capabilities, Surface};
    use egui::{pos2, Rect};
    use std::cell::RefCell;

    pub(super) fn recording_handlers() -> (PointerHandlers, Rc<RefCell<Vec<(&'static str, PointerEvent)>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let make = |phase: &'static str| -> PointerHandler {
            let log = log.clone();
            Rc::new(move |e: &PointerEvent| log.borrow_mut().push((phase, e.clone())))
        };
        let handlers = PointerHandlers {
            on_start: make("start"),
            on_move: make("move"),
            on_end: make("end"),
            on_cancel: make("cancel"),
        };
        (handlers, log)
    }

    #[test]
    fn detach_unbinds_everything_once() {
        for caps in [Capabilities::mouse(), Capabilities::touch()] {
            let surface = Surface::with_capabilities(caps);
            let el = surface.create_element(Rect::from_min_max(pos2(0., 0.), pos2(10., 10.)));
            let (handlers, _) = recording_handlers();
            let mut binding = attach(&el, handlers);
            let expected = if caps.touch { 4 } else { 3 };
            assert_eq!(surface.listener_count(), expected);

            binding.detach();
            assert_eq!(surface.listener_count(), 0);
            assert!(!binding.is_attached());
            binding.detach();
        }
    }

    #[test]
    fn element_without_surface_binds_nothing() {
        let el = {
            let surface = Surface::with_capabilities(Capabilities::mouse());
            surface.create_element(Rect::from_min_max(pos2(0., 0.), pos2(10., 10.)))
        };
        let (handlers, _) = recording_handlers();
        let binding = attach(&el, handlers);
        assert!(!binding.is_attached());
    }
}
