//! Camera-orientation fusion for panorama viewing.
//!
//! Touch panning, device heading and a startup/correction offset are combined
//! into one camera orientation every frame. Cylindrical panoramas sum the three
//! angle vectors; spherical panoramas driven by device motion use the attitude
//! quaternion remapped for the screen orientation.
//!
//! # Modules
//!
//! - [`math`]: angle vector / quaternion helpers
//! - [`remap`]: screen-orientation quaternion remap table
//! - [`orientation`]: orientation state and camera composition
//! - [`motion`]: device-motion samples and the motion adapter
//! - [`sensor`]: injectable motion sources
//! - [`gesture`]: touch-pan adapter
//! - [`inertia`]: deceleration after a pan is released
//! - [`report`]: movement reports for compass listeners
//! - [`panorama`]: modes and the [`PanoramaController`]
//! - [`backend`]: rendering backend interface
//! - [`config`]: viewer configuration
//! - [`error`]: sensor and configuration errors

pub mod backend;
pub mod config;
pub mod error;
pub mod gesture;
pub mod inertia;
pub mod math;
pub mod motion;
pub mod orientation;
pub mod panorama;
pub mod remap;
pub mod report;
pub mod sensor;

pub use backend::RenderBackend;
pub use config::{MotionSetting, ViewerConfig};
pub use error::{ConfigError, SensorError};
pub use gesture::{GestureEvent, GestureOutcome};
pub use motion::MotionSample;
pub use orientation::CameraOrientation;
pub use panorama::{ControlMode, PanoramaController, ProjectionMode};
pub use remap::ScreenOrientation;
pub use report::{CompassListener, MovementReport};
pub use sensor::{MotionSource, NullMotionSource, ScriptedMotionSource};
