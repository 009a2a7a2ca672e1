//! Browser bindings for the magnifying-glass effect. Geometry, load staging
//! and dispatch live in `magnifier-core`; this crate wires them to the DOM.

mod dom;
pub mod events;
mod magnifier;
mod options;

pub use magnifier::Magnifier;
pub use magnifier_core::{DisplayMode, MagnifierError, WheelDirection, ERROR_NAME};
