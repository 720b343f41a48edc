mod joint_path_planner;

pub use self::joint_path_planner::*;
