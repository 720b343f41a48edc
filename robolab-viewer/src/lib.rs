//! # Display seam for the robolab demos
//!
//! The planners and the separation loop only talk to a [`Viewer`]. A real
//! front-end can implement it; this crate ships a logging viewer and a
//! recorder whose frames can be written as JSON and replayed elsewhere.

#![warn(rust_2018_idioms)]

pub mod colors;
mod error;
mod marker;
mod recording;

use std::{fmt, thread, time::Duration};

use auto_impl::auto_impl;
use tracing::{info, trace};

pub use crate::{colors::Rgba, error::*, marker::*, recording::*};

/// Something that can show a configuration of type `Q`.
#[auto_impl(&, Box, Arc)]
pub trait Viewer<Q: ?Sized> {
    /// Shows the configuration.
    fn display(&self, q: &Q);

    /// Adds or moves a decorative object.
    fn place_marker(&self, _marker: &Marker) {}

    /// Pauses between two frames of an animation.
    fn sleep(&self, _duration: Duration) {}
}

/// Viewer ignoring everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopViewer;

impl<Q: ?Sized> Viewer<Q> for NoopViewer {
    fn display(&self, _q: &Q) {}
}

/// Viewer writing every frame to the `tracing` log.
#[derive(Debug, Default, Clone)]
pub struct TracingViewer {
    name: String,
    animate: bool,
}

impl TracingViewer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            animate: false,
        }
    }

    /// Really sleep in [`Viewer::sleep`].
    pub fn animate(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }
}

impl<Q: ?Sized + fmt::Debug> Viewer<Q> for TracingViewer {
    fn display(&self, q: &Q) {
        trace!(viewer = %self.name, ?q, "display");
    }

    fn place_marker(&self, marker: &Marker) {
        info!(
            viewer = %self.name,
            marker = %marker.name,
            color = %format!("{:#08x}", marker.color.to_int()),
            translation = ?marker.pose.translation,
            "marker"
        );
    }

    fn sleep(&self, duration: Duration) {
        if self.animate {
            thread::sleep(duration);
        }
    }
}
