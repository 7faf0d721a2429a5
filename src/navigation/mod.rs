pub mod camera;
pub mod presets;

pub use camera::{CameraState, Motion, NavigationTuning, Navigator, Status, TickOutcome};
pub use presets::{PresetCoordinate, PRESETS};
