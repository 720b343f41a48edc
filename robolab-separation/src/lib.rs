//! # Kinematic separation of overlapping rigid bodies
//!
//! Each body of a [`Scene`] is a free-flying rigid body. Pairs of geometries
//! closer than a margin produce [`ContactModel`]s, and [`separate`] repeatedly
//! pushes both sides of every contact along its normal until the bodies are
//! apart. There is no dynamics involved, only contact distances.

#![warn(rust_2018_idioms)]

mod contact;
mod errors;
mod motion;
mod scene;
mod separate;

pub use crate::{contact::*, errors::*, motion::*, scene::*, separate::*};
