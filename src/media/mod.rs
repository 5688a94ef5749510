//! Playback surfaces
//!
//! A surface is one independently playable, seekable media source with a
//! presentation layer on top. The controller drives two of them through the
//! [`MediaSurface`] trait and never sees how frames are produced.

mod load;
mod simulated;

pub use load::{LoadCompleter, LoadFuture};
pub use simulated::{SimulatedSurface, TIME_UPDATE_INTERVAL};

use crate::MediaError;
use std::time::Duration;

/// How much media data a surface has buffered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    #[default]
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    /// Enough data is buffered to start playback without stalling
    pub fn can_play(&self) -> bool {
        *self >= ReadyState::HaveFutureData
    }
}

/// Signals a surface raises while it loads and plays
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceEvent {
    /// Buffering crossed the playable threshold
    CanPlay,
    /// Loading failed
    Error(MediaError),
    /// Playback position moved
    TimeUpdate { position: Duration, duration: Duration },
    /// Playback reached the end of a non-looping source
    Ended,
}

/// Presentation state derived from the two visual flags
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerState {
    Hidden,
    FadingIn,
    Active,
}

impl std::fmt::Display for LayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerState::Hidden => write!(f, "hidden"),
            LayerState::FadingIn => write!(f, "fading-in"),
            LayerState::Active => write!(f, "active"),
        }
    }
}

/// Visual flags of a surface's presentation layer
///
/// `active` and `fading_in` are independent; a layer is visible when either
/// is set, and a fading-in layer is drawn above an active one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisualLayer {
    pub active: bool,
    pub fading_in: bool,
    /// Duration of the opacity transition between states
    pub transition: Duration,
}

impl VisualLayer {
    pub fn state(&self) -> LayerState {
        if self.fading_in {
            LayerState::FadingIn
        } else if self.active {
            LayerState::Active
        } else {
            LayerState::Hidden
        }
    }

    /// Opacity the layer is transitioning towards
    pub fn target_opacity(&self) -> f32 {
        if self.active || self.fading_in {
            1.0
        } else {
            0.0
        }
    }

    /// Stacking order, higher draws on top
    pub fn z_order(&self) -> u8 {
        match self.state() {
            LayerState::FadingIn => 2,
            LayerState::Active => 1,
            LayerState::Hidden => 0,
        }
    }
}

/// A playable, seekable media source with a presentation layer
pub trait MediaSurface {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Start or resume playback
    fn play(&mut self) -> Result<(), MediaError>;

    /// Pause playback, keeping the current position
    fn pause(&mut self);

    /// Force a reload; the returned future resolves once the surface can play
    fn load(&mut self) -> LoadFuture;

    fn position(&self) -> Duration;

    fn set_position(&mut self, position: Duration);

    fn duration(&self) -> Duration;

    fn ready_state(&self) -> ReadyState;

    fn is_playing(&self) -> bool;

    fn visual(&self) -> &VisualLayer;

    fn visual_mut(&mut self) -> &mut VisualLayer;

    /// Advance to `now` and drain the signals raised since the last call
    fn poll_events(&mut self, now: Duration) -> Vec<SurfaceEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_state_from_flags() {
        let mut layer = VisualLayer::default();
        assert_eq!(layer.state(), LayerState::Hidden);
        assert_eq!(layer.target_opacity(), 0.0);

        layer.active = true;
        assert_eq!(layer.state(), LayerState::Active);

        layer.fading_in = true;
        assert_eq!(layer.state(), LayerState::FadingIn);
        assert_eq!(layer.target_opacity(), 1.0);
        assert!(layer.z_order() > VisualLayer { active: true, ..Default::default() }.z_order());
    }

    #[test]
    fn test_ready_state_threshold() {
        assert!(!ReadyState::HaveCurrentData.can_play());
        assert!(ReadyState::HaveFutureData.can_play());
        assert!(ReadyState::HaveEnoughData.can_play());
    }
}
