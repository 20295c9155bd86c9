use egui::{vec2, Pos2, Vec2};
use std::cell::RefCell;
use std::rc::Rc;

use crate::pointer::{self, PointerBinding, PointerEvent, PointerHandlers};
use crate::surface::Element;
use crate::transform::Matrix;

/// Limits on the translation of a dragged element. `None` leaves that
/// direction unbounded.
///
/// Limits are in the element's scaled space: while the element is scaled up
/// (scale factor above 1) the limits of that axis are multiplied by the scale
/// on every move of a gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    /// Lowest allowed X translation
    pub min_x: Option<f32>,
    /// Highest allowed X translation
    pub max_x: Option<f32>,
    /// Lowest allowed Y translation
    pub min_y: Option<f32>,
    /// Highest allowed Y translation
    pub max_y: Option<f32>,
}

impl Bounds {
    fn scale_x(&mut self, factor: f32) {
        self.min_x = self.min_x.map(|v| v * factor);
        self.max_x = self.max_x.map(|v| v * factor);
    }

    fn scale_y(&mut self, factor: f32) {
        self.min_y = self.min_y.map(|v| v * factor);
        self.max_y = self.max_y.map(|v| v * factor);
    }

    fn clamp(&self, x: f32, y: f32) -> Vec2 {
        vec2(
            clamp_axis(x, self.min_x, self.max_x),
            clamp_axis(y, self.min_y, self.max_y),
        )
    }
}

fn clamp_axis(v: f32, min: Option<f32>, max: Option<f32>) -> f32 {
    match (min, max) {
        (_, Some(max)) if v > max => max,
        (Some(min), _) if v < min => min,
        _ => v,
    }
}

/// Movement reported to [`DragOptions::with_on_moving`].
#[derive(Debug)]
pub struct DragMove<'a> {
    /// Distance from where the gesture started
    pub total_delta: Vec2,
    /// Distance since the previous move
    pub delta: Vec2,
    /// The pointer event that caused the move
    pub original_event: &'a PointerEvent,
}

/// What to do with the translation computed for a move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MoveResponse {
    /// Write the clamped translation to the element
    #[default]
    Commit,
    /// Leave the element untouched, e.g. because the handler applied the
    /// movement itself
    Veto,
}

impl From<bool> for MoveResponse {
    fn from(commit: bool) -> Self {
        if commit {
            MoveResponse::Commit
        } else {
            MoveResponse::Veto
        }
    }
}

type EventHandler = Box<dyn FnMut(&PointerEvent)>;
type MoveHandler = Box<dyn FnMut(&DragMove<'_>) -> MoveResponse>;

/// Callbacks and limits for a [`Draggable`].
#[derive(Default)]
pub struct DragOptions {
    on_start: Option<EventHandler>,
    on_moving: Option<MoveHandler>,
    on_end: Option<EventHandler>,
    /// Translation limits
    pub bounds: Bounds,
}

impl DragOptions {
    /// Called when a gesture starts on the element.
    pub fn with_on_start(mut self, f: impl FnMut(&PointerEvent) + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Called on every move of an active gesture, before the element is
    /// updated. Returning [`MoveResponse::Veto`] skips the update.
    pub fn with_on_moving(mut self, f: impl FnMut(&DragMove<'_>) -> MoveResponse + 'static) -> Self {
        self.on_moving = Some(Box::new(f));
        self
    }

    /// Called when an active gesture ends or is cancelled.
    pub fn with_on_end(mut self, f: impl FnMut(&PointerEvent) + 'static) -> Self {
        self.on_end = Some(Box::new(f));
        self
    }

    /// Limits for the translation, in the element's pixel space.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }
}

#[derive(Default)]
struct Gesture {
    active: bool,
    /// Last observed point
    start: Pos2,
    /// Point the gesture started at
    origin: Pos2,
    /// Working copy of the configured bounds
    bounds: Bounds,
}

struct Callbacks {
    on_start: Option<EventHandler>,
    on_moving: Option<MoveHandler>,
    on_end: Option<EventHandler>,
}

/// State shared with the pointer listeners.
///
/// Gesture state and callbacks live in separate cells. A callback is taken
/// out of its cell while it runs, so it may dispatch surface events that
/// reach this controller again; the nested call skips that same callback.
struct DragCore {
    element: Element,
    bounds: Bounds,
    gesture: RefCell<Gesture>,
    callbacks: RefCell<Callbacks>,
}

impl DragCore {
    fn handle_start(&self, event: &PointerEvent) {
        let Some(point) = event.primary() else {
            return;
        };
        *self.gesture.borrow_mut() = Gesture {
            active: true,
            start: point,
            origin: point,
            bounds: self.bounds,
        };
        log::trace!("drag start on {:?} at {:?}", self.element, point);

        let on_start = self.callbacks.borrow_mut().on_start.take();
        if let Some(mut on_start) = on_start {
            on_start(event);
            self.callbacks.borrow_mut().on_start = Some(on_start);
        }
    }

    fn handle_move(&self, event: &PointerEvent) {
        let (matrix, offset, delta, total_delta) = {
            let mut gesture = self.gesture.borrow_mut();
            if !gesture.active {
                return;
            }
            let Some(point) = event.primary() else {
                log::debug!("move without contact points on {:?}", self.element);
                return;
            };

            // re-read every time, the transform may have been changed outside
            let matrix = Matrix::read(&self.element);
            let delta = point - gesture.start;
            let candidate = delta + matrix.offset();
            gesture.start = point;

            if matrix.scale_x() > 1. {
                gesture.bounds.scale_x(matrix.scale_x());
            }
            if matrix.scale_y() > 1. {
                gesture.bounds.scale_y(matrix.scale_y());
            }
            let offset = gesture.bounds.clamp(candidate.x, candidate.y);
            (matrix, offset, delta, point - gesture.origin)
        };

        let on_moving = self.callbacks.borrow_mut().on_moving.take();
        let response = match on_moving {
            Some(mut on_moving) => {
                let response = on_moving(&DragMove {
                    total_delta,
                    delta,
                    original_event: event,
                });
                self.callbacks.borrow_mut().on_moving = Some(on_moving);
                response
            }
            None => MoveResponse::Commit,
        };
        if response == MoveResponse::Veto {
            log::trace!("move vetoed on {:?}", self.element);
            return;
        }
        matrix.with_offset(offset).write(&self.element);
    }

    fn handle_end(&self, event: &PointerEvent) {
        let was_active = std::mem::take(&mut self.gesture.borrow_mut().active);
        if !was_active {
            return;
        }
        log::trace!("drag end on {:?}", self.element);

        let on_end = self.callbacks.borrow_mut().on_end.take();
        if let Some(mut on_end) = on_end {
            on_end(event);
            self.callbacks.borrow_mut().on_end = Some(on_end);
        }
    }
}

/// Makes an element follow pointer drags by rewriting the translation of
/// its transform.
///
/// Listeners stay bound until [`Draggable::destroy`] is called or the
/// value is dropped.
pub struct Draggable {
    core: Rc<DragCore>,
    /// Translation before any drag
    origin: Vec2,
    binding: PointerBinding,
}

impl Draggable {
    /// Bind pointer listeners to `element`. The translation it has now is
    /// what [`Draggable::reset`] returns to.
    pub fn new(element: &Element, options: DragOptions) -> Self {
        let DragOptions {
            on_start,
            on_moving,
            on_end,
            bounds,
        } = options;

        let core = Rc::new(DragCore {
            element: element.clone(),
            bounds,
            gesture: RefCell::new(Gesture::default()),
            callbacks: RefCell::new(Callbacks {
                on_start,
                on_moving,
                on_end,
            }),
        });

        let start = Rc::clone(&core);
        let moving = Rc::clone(&core);
        let end = Rc::clone(&core);
        let cancel = Rc::clone(&core);
        let binding = pointer::attach(
            element,
            PointerHandlers {
                on_start: Rc::new(move |e: &PointerEvent| start.handle_start(e)),
                on_move: Rc::new(move |e: &PointerEvent| moving.handle_move(e)),
                on_end: Rc::new(move |e: &PointerEvent| end.handle_end(e)),
                on_cancel: Rc::new(move |e: &PointerEvent| cancel.handle_end(e)),
            },
        );

        Self {
            origin: Matrix::read(element).offset(),
            core,
            binding,
        }
    }

    /// The dragged element.
    pub fn element(&self) -> &Element {
        &self.core.element
    }

    /// Whether a gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.core.gesture.borrow().active
    }

    /// Move the element back to the translation it had when this
    /// [`Draggable`] was created. Scale, skew and rotation are kept from the
    /// current transform.
    pub fn reset(&self) {
        let element = &self.core.element;
        Matrix::read(element).with_offset(self.origin).write(element);
    }

    /// Stop listening for pointer input.
    ///
    /// A gesture in progress is abandoned: no end callback fires and the
    /// element keeps its current transform.
    pub fn destroy(&mut self) {
        if self.binding.is_attached() {
            log::trace!("destroying draggable on {:?}", self.core.element);
        }
        self.binding.detach();
    }
}

impl Drop for Draggable {
    fn drop(&mut self) {
        self.destroy();
    }
}
