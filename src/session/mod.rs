//! Run orchestration: the run controller and frame pacing.

/// Run controller and the shutdown path.
pub mod controller;
/// Frame pacers.
pub mod pacing;
