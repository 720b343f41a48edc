use std::{fmt, path::Path, time::Duration};

use robolab_viewer::{Marker, RecordingViewer, TracingViewer, Viewer};
use serde::Serialize;

/// Logs every frame and keeps them for [`AppViewer::save`]
#[derive(Debug)]
pub struct AppViewer<T> {
    tracing: TracingViewer,
    recording: RecordingViewer<T>,
}

impl<T: Clone> AppViewer<T> {
    pub fn new(name: &str, animate: bool) -> Self {
        Self {
            tracing: TracingViewer::new(name).animate(animate),
            recording: RecordingViewer::new(),
        }
    }

    pub fn num_frames(&self) -> usize {
        self.recording.num_frames()
    }
}

impl<T: Serialize> AppViewer<T> {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), crate::Error> {
        self.recording.save(path)?;
        Ok(())
    }
}

impl<T: Clone + fmt::Debug> Viewer<[T]> for AppViewer<T> {
    fn display(&self, q: &[T]) {
        self.tracing.display(q);
        self.recording.display(q);
    }

    fn place_marker(&self, marker: &Marker) {
        Viewer::<[T]>::place_marker(&self.tracing, marker);
        self.recording.place_marker(marker);
    }

    fn sleep(&self, duration: Duration) {
        Viewer::<[T]>::sleep(&self.tracing, duration);
    }
}
