use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::Serialize;
use tracing::debug;

use crate::{Marker, Result, Viewer};

/// Keeps every displayed frame and marker in memory.
#[derive(Debug)]
pub struct RecordingViewer<T> {
    frames: Mutex<Vec<Vec<T>>>,
    markers: Mutex<Vec<Marker>>,
}

impl<T> Default for RecordingViewer<T> {
    fn default() -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            markers: Mutex::new(Vec::new()),
        }
    }
}

// A panic while recording leaves the data usable, so poisoning is ignored
impl<T> RecordingViewer<T> {
    fn lock_frames(&self) -> MutexGuard<'_, Vec<Vec<T>>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_markers(&self) -> MutexGuard<'_, Vec<Marker>> {
        self.markers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Serialize)]
struct Recording<'a, T> {
    frames: &'a [Vec<T>],
    markers: &'a [Marker],
}

impl<T: Clone> RecordingViewer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Vec<T>> {
        self.lock_frames().clone()
    }

    pub fn last_frame(&self) -> Option<Vec<T>> {
        self.lock_frames().last().cloned()
    }

    pub fn num_frames(&self) -> usize {
        self.lock_frames().len()
    }

    /// Markers, the latest version of each name only.
    pub fn markers(&self) -> Vec<Marker> {
        self.lock_markers().clone()
    }
}

impl<T: Serialize> RecordingViewer<T> {
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        let frames = self.lock_frames();
        let markers = self.lock_markers();
        serde_json::to_writer(
            writer,
            &Recording {
                frames: &frames,
                markers: &markers,
            },
        )?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_json(&mut writer)?;
        writer.flush()?;
        debug!("saved recording to {:?}", path.as_ref());
        Ok(())
    }
}

impl<T: Clone> Viewer<[T]> for RecordingViewer<T> {
    fn display(&self, q: &[T]) {
        self.lock_frames().push(q.to_vec());
    }

    fn place_marker(&self, marker: &Marker) {
        let mut markers = self.lock_markers();
        match markers.iter_mut().find(|m| m.name == marker.name) {
            Some(m) => *m = marker.clone(),
            None => markers.push(marker.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{colors, MarkerShape, Pose};

    #[test]
    fn records_frames() {
        let viewer = RecordingViewer::<f64>::new();
        assert_eq!(viewer.num_frames(), 0);
        assert!(viewer.last_frame().is_none());
        viewer.display(&[0.0, 1.0]);
        viewer.display(&[0.5, 1.5]);
        assert_eq!(viewer.num_frames(), 2);
        assert_eq!(viewer.last_frame().unwrap(), vec![0.5, 1.5]);
    }

    #[test]
    fn markers_are_replaced_by_name() {
        let viewer = RecordingViewer::<f64>::new();
        let shape = MarkerShape::Sphere { radius: 0.05 };
        viewer.place_marker(&Marker::new(
            "target",
            shape.clone(),
            colors::RED,
            Pose::from_translation(0.5, 0.0, 0.5),
        ));
        viewer.place_marker(&Marker::new(
            "target",
            shape,
            colors::GREEN,
            Pose::from_translation(0.1, 0.0, 0.2),
        ));
        let markers = viewer.markers();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].color, colors::GREEN);
    }

    #[test]
    fn keeps_recording_after_a_panic() {
        let viewer = RecordingViewer::<f64>::new();
        viewer.display(&[1.0]);
        std::thread::scope(|s| {
            let result = s
                .spawn(|| {
                    let _frames = viewer.lock_frames();
                    let _markers = viewer.lock_markers();
                    panic!("panic while holding the locks");
                })
                .join();
            assert!(result.is_err());
        });
        assert!(viewer.frames.is_poisoned());
        assert!(viewer.markers.is_poisoned());

        viewer.display(&[2.0]);
        viewer.place_marker(&Marker::new(
            "target",
            MarkerShape::Sphere { radius: 0.05 },
            colors::GREEN,
            Pose::from_translation(0.5, 0.0, 0.5),
        ));
        assert_eq!(viewer.frames(), vec![vec![1.0], vec![2.0]]);
        assert_eq!(viewer.markers().len(), 1);
        let mut buf = Vec::new();
        viewer.write_json(&mut buf).unwrap();
        assert!(!buf.is_empty());
    }

    #[test]
    fn json_output() {
        let viewer = RecordingViewer::<f64>::new();
        viewer.display(&[1.0]);
        let mut buf = Vec::new();
        viewer.write_json(&mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert_eq!(s, r#"{"frames":[[1.0]],"markers":[]}"#);
    }
}
