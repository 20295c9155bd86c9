#![warn(missing_docs)]
#![allow(rustdoc::bare_urls)]
#![doc = include_str!("../README.md")]
//! # Control bar and draggable demo
//! ```no_run
#![doc = include_str!("../demos/main.rs")]
//! ```

mod control_bar;
pub use control_bar::*;
mod draggable;
pub use draggable::*;
pub mod pointer;
pub use pointer::PointerEvent;
pub mod surface;
pub use surface::{Capabilities, Element, Surface};
mod time;
pub use time::format_time;
mod transform;
pub use transform::*;
