//! Avatar - conversational avatar built from two looping videos
//!
//! An idle loop plays until the user sends a message; after a simulated
//! synthesis delay the response clip fades in over it, and just before the
//! clip ends the idle loop fades back in at a random position.

pub mod config;
pub mod controller;
pub mod error;
pub mod media;
pub mod scenario;
pub mod ui;

pub use config::AvatarConfig;
pub use controller::{ControllerEvent, ControllerSnapshot, CrossfadeController, CyclePhase};
pub use error::{AvatarError, MediaError, Result};
pub use media::{MediaSurface, SimulatedSurface, VisualLayer};
