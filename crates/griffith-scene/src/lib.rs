//! The Griffith Observatory scene: static authoring, the procedural skyline,
//! the camera director, input controls and the frame loop.

pub mod camera_director;
pub mod city;
pub mod composer;
pub mod controls;
pub mod frame;

pub use camera_director::{
    CameraDirector, CameraMode, CameraPose, CameraTransition, EasingFunction, INITIAL_EYE,
    INITIAL_TARGET,
};
pub use city::{
    BuildingSite, CityLayout, LayoutError, MAX_BUILDINGS, MAX_PLACEMENT_ATTEMPTS, MIN_BUILDINGS,
    place_buildings,
};
pub use composer::{COURTYARD_LAMPS, LAMP_LIGHT_COLOR, SceneComposer, weather_material};
pub use controls::{ControlBindings, SceneControl, UnknownControl};
pub use frame::{FrameReport, GriffithScene, MAX_SHADOW_RESOLUTION};
