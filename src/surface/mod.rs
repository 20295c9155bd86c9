//! A small retained layer over egui input.
//!
//! A [`Surface`] owns a set of elements (boxes with a bounding rect and an
//! inline `transform` style) and a registry of listeners scoped either to one
//! element or to the whole window. Native touch and mouse events are translated
//! from [`egui::Event`]s and dispatched to the listeners, element scope first.

use egui::{Pos2, Rect};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

mod egui_input;

/// Identifies an element on a [`Surface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u64);

/// Handle returned by [`Surface::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Input capabilities of the runtime, detected once per surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The platform delivers native touch events
    pub touch: bool,
}

impl Capabilities {
    /// Capabilities of the platform this crate was compiled for.
    pub fn detect() -> Self {
        Self {
            touch: cfg!(any(target_os = "android", target_os = "ios")),
        }
    }

    /// A desktop-style environment: mouse only.
    pub fn mouse() -> Self {
        Self { touch: false }
    }

    /// A touch-capable environment.
    pub fn touch() -> Self {
        Self { touch: true }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

/// Where a listener is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only events whose target is this element
    Element(ElementId),
    /// Every event of the bound type
    Window,
}

/// Native event types a listener can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A contact went down
    TouchStart,
    /// A contact moved
    TouchMove,
    /// A contact was lifted
    TouchEnd,
    /// A contact was taken away by the platform
    TouchCancel,
    /// Primary button pressed
    MouseDown,
    /// Pointer moved, pressed or not
    MouseMove,
    /// Primary button released
    MouseUp,
}

/// One contact of a touch event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    /// Stable for the lifetime of the contact
    pub identifier: u64,
    /// Current position
    pub pos: Pos2,
}

/// Payload of the touch event types.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    /// Contacts still on the surface after this event
    pub touches: Vec<Touch>,
    /// Contacts that changed in this event
    pub changed_touches: Vec<Touch>,
    /// Element the contact started on
    pub target: Option<ElementId>,
}

/// Payload of the mouse event types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    /// Pointer position
    pub pos: Pos2,
    /// Element under the pointer
    pub target: Option<ElementId>,
}

/// An event as delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    /// One of the touch event types
    Touch(TouchEvent),
    /// One of the mouse event types
    Mouse(MouseEvent),
}

impl NativeEvent {
    /// The element the event is addressed to, if any.
    pub fn target(&self) -> Option<ElementId> {
        match self {
            NativeEvent::Touch(t) => t.target,
            NativeEvent::Mouse(m) => m.target,
        }
    }
}

type Listener = Rc<dyn Fn(&NativeEvent)>;

struct ElementData {
    id: ElementId,
    rect: Rect,
    transform: Option<String>,
}

struct Registration {
    id: ListenerId,
    scope: Scope,
    kind: EventType,
    callback: Listener,
}

#[derive(Clone, Copy)]
struct ActiveTouch {
    identifier: u64,
    pos: Pos2,
    target: Option<ElementId>,
}

impl ActiveTouch {
    fn touch(&self) -> Touch {
        Touch {
            identifier: self.identifier,
            pos: self.pos,
        }
    }
}

struct SurfaceState {
    capabilities: Capabilities,
    /// Paint order, last is topmost
    elements: Vec<ElementData>,
    listeners: Vec<Registration>,
    /// Touches currently down, in start order
    touches: Vec<ActiveTouch>,
    next_id: u64,
}

impl SurfaceState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn element(&self, id: ElementId) -> Option<&ElementData> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut ElementData> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    fn hit_test(&self, pos: Pos2) -> Option<ElementId> {
        self.elements
            .iter()
            .rev()
            .find(|e| e.rect.contains(pos))
            .map(|e| e.id)
    }
}

/// Shared handle to the element and listener registry.
///
/// Cloning a [`Surface`] yields another handle to the same state.
#[derive(Clone)]
pub struct Surface {
    state: Rc<RefCell<SurfaceState>>,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Surface")
            .field("capabilities", &state.capabilities)
            .field("elements", &state.elements.len())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl Surface {
    /// Create a surface with the capabilities of the current platform.
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::detect())
    }

    /// Create a surface with explicit capabilities.
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            state: Rc::new(RefCell::new(SurfaceState {
                capabilities,
                elements: Vec::new(),
                listeners: Vec::new(),
                touches: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// What input the platform provides.
    pub fn capabilities(&self) -> Capabilities {
        self.state.borrow().capabilities
    }

    /// Register a new element on top of the existing ones.
    pub fn create_element(&self, rect: Rect) -> Element {
        let mut state = self.state.borrow_mut();
        let id = ElementId(state.next_id());
        state.elements.push(ElementData {
            id,
            rect,
            transform: None,
        });
        Element {
            id,
            surface: Rc::downgrade(&self.state),
        }
    }

    /// Remove an element together with the listeners scoped to it.
    pub fn remove_element(&self, id: ElementId) {
        let mut state = self.state.borrow_mut();
        state.elements.retain(|e| e.id != id);
        state.listeners.retain(|l| l.scope != Scope::Element(id));
    }

    /// The topmost element containing `pos`.
    pub fn element_at(&self, pos: Pos2) -> Option<ElementId> {
        self.state.borrow().hit_test(pos)
    }

    /// Bind `callback` to events of `kind` reaching `scope`.
    pub fn add_listener(
        &self,
        scope: Scope,
        kind: EventType,
        callback: impl Fn(&NativeEvent) + 'static,
    ) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id());
        state.listeners.push(Registration {
            id,
            scope,
            kind,
            callback: Rc::new(callback),
        });
        id
    }

    /// Unbind a listener. Returns `false` if it was not bound.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|l| l.id != id);
        state.listeners.len() != before
    }

    /// Whether `id` is still registered.
    pub fn is_bound(&self, id: ListenerId) -> bool {
        self.state.borrow().listeners.iter().any(|l| l.id == id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Deliver an event to the listeners bound to its type.
    ///
    /// Listeners on the target element run before window listeners. No borrow
    /// of the surface is held while a listener runs, and a listener unbound by
    /// an earlier one is skipped.
    pub fn dispatch(&self, kind: EventType, event: NativeEvent) {
        let target = event.target();
        let matched: Vec<(ListenerId, Listener)> = {
            let state = self.state.borrow();
            let on_target = state.listeners.iter().filter(|l| {
                l.kind == kind && matches!(l.scope, Scope::Element(id) if Some(id) == target)
            });
            let on_window = state
                .listeners
                .iter()
                .filter(|l| l.kind == kind && l.scope == Scope::Window);
            on_target
                .chain(on_window)
                .map(|l| (l.id, l.callback.clone()))
                .collect()
        };

        for (id, callback) in matched {
            if self.is_bound(id) {
                callback(&event);
            }
        }
    }
}

/// Handle to one element of a [`Surface`].
///
/// Holds a weak reference: once every [`Surface`] handle is dropped the
/// element reads as empty and writes are ignored.
#[derive(Clone)]
pub struct Element {
    id: ElementId,
    surface: Weak<RefCell<SurfaceState>>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Element").field(&self.id).finish()
    }
}

impl Element {
    /// Identifier of the element on its surface.
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// The surface this element belongs to, if it is still alive.
    pub fn surface(&self) -> Option<Surface> {
        self.surface.upgrade().map(|state| Surface { state })
    }

    fn with_data<R>(&self, f: impl FnOnce(&mut ElementData) -> R) -> Option<R> {
        let state = self.surface.upgrade()?;
        let mut state = state.borrow_mut();
        state.element_mut(self.id).map(f)
    }

    /// Bounding box as last reported by the host.
    pub fn rect(&self) -> Rect {
        let Some(state) = self.surface.upgrade() else {
            return Rect::NOTHING;
        };
        let rect = state.borrow().element(self.id).map(|e| e.rect);
        rect.unwrap_or(Rect::NOTHING)
    }

    /// Update the bounding box used for hit testing.
    pub fn set_rect(&self, rect: Rect) {
        self.with_data(|e| e.rect = rect);
    }

    /// Inline `transform` style, if one was written.
    pub fn inline_transform(&self) -> Option<String> {
        self.with_data(|e| e.transform.clone()).flatten()
    }

    /// Write the inline `transform` style.
    pub fn set_inline_transform(&self, value: impl Into<String>) {
        let value = value.into();
        self.with_data(|e| e.transform = Some(value));
    }

    /// Remove the inline `transform` style.
    pub fn clear_inline_transform(&self) {
        self.with_data(|e| e.transform = None);
    }

    /// The transform as the host resolves it, `none` when unset.
    pub fn computed_transform(&self) -> String {
        self.inline_transform()
            .unwrap_or_else(|| String::from("none"))
    }
}
