mod error;
mod path_planning_config;
mod separation_config;
pub mod utils;
mod viewer;

pub use crate::{error::*, path_planning_config::*, separation_config::*, viewer::*};
