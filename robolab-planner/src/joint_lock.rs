use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::*;

/// Maps a reduced configuration of the active joints to the full one and back
///
/// Locked joints stay at zero.
///
/// # Example
///
/// ```
/// let lock = robolab_planner::JointLock::default();
/// let full = lock.expand(&[0.5, -1.0]).unwrap();
/// assert_eq!(full, vec![0.0, 0.5, -1.0, 0.0, 0.0, 0.0]);
/// assert_eq!(lock.reduce(&full).unwrap(), vec![0.5, -1.0]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct JointLock {
    /// DoF of the full configuration
    #[serde(default = "default_dof")]
    pub dof: usize,
    /// Indices of the joints which can move
    #[serde(default = "default_active")]
    pub active: Vec<usize>,
}

fn default_dof() -> usize {
    6
}

/// Shoulder lift and elbow of the UR5
fn default_active() -> Vec<usize> {
    vec![1, 2]
}

impl Default for JointLock {
    fn default() -> Self {
        Self {
            dof: default_dof(),
            active: default_active(),
        }
    }
}

fn out_of_range(index: usize, dof: usize) -> Error {
    Error::Other {
        error: format!("active joint index {index} is out of range (dof={dof})"),
    }
}

impl JointLock {
    pub fn new(dof: usize, active: Vec<usize>) -> Result<Self> {
        let lock = Self { dof, active };
        lock.validate()?;
        Ok(lock)
    }

    /// Checks that every active index addresses a joint of the full configuration
    ///
    /// The fields are public and deserialized as is, so a lock may be built without [`JointLock::new`].
    pub fn validate(&self) -> Result<()> {
        match self.active.iter().find(|&&i| i >= self.dof) {
            Some(&index) => Err(out_of_range(index, self.dof)),
            None => Ok(()),
        }
    }

    /// Number of active joints
    pub fn reduced_dof(&self) -> usize {
        self.active.len()
    }

    pub fn expand(&self, reduced: &[f64]) -> Result<Vec<f64>> {
        if reduced.len() != self.active.len() {
            return Err(Error::DofMismatch(reduced.len(), self.active.len()));
        }
        let mut full = vec![0.0; self.dof];
        for (&index, &value) in self.active.iter().zip(reduced) {
            *full
                .get_mut(index)
                .ok_or_else(|| out_of_range(index, self.dof))? = value;
        }
        Ok(full)
    }

    pub fn reduce(&self, full: &[f64]) -> Result<Vec<f64>> {
        if full.len() != self.dof {
            return Err(Error::DofMismatch(full.len(), self.dof));
        }
        self.active
            .iter()
            .map(|&index| {
                full.get(index)
                    .copied()
                    .ok_or_else(|| out_of_range(index, self.dof))
            })
            .collect()
    }
}
