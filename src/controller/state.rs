//! Controller phases, events and snapshots
//!
//! The controller owns the mutable state; observers get either a copy
//! ([`ControllerSnapshot`]) or a stream of [`ControllerEvent`]s.

use crate::media::VisualLayer;
use crate::MediaError;
use std::time::Duration;

/// Where the controller is within a send cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CyclePhase {
    /// Resting on the idle loop, send enabled
    #[default]
    Idle,
    /// Waiting out the synthesis delay
    AwaitingSynthesis,
    /// Waiting for the response surface to become playable
    LoadingResponse,
    /// Response layer fading in over idle
    CrossfadingToResponse,
    /// Response playing, watching for the lead window
    PlayingResponse,
    /// Idle layer fading back in over the response
    CrossfadingToIdle,
}

impl CyclePhase {
    /// Check if resting
    pub fn is_idle(&self) -> bool {
        matches!(self, CyclePhase::Idle)
    }

    /// Check if the response is on stage and may trigger the return crossfade
    pub fn is_response_on_stage(&self) -> bool {
        matches!(
            self,
            CyclePhase::CrossfadingToResponse | CyclePhase::PlayingResponse
        )
    }

    /// Snake-case name used in scenario files and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePhase::Idle => "idle",
            CyclePhase::AwaitingSynthesis => "awaiting_synthesis",
            CyclePhase::LoadingResponse => "loading_response",
            CyclePhase::CrossfadingToResponse => "crossfading_to_response",
            CyclePhase::PlayingResponse => "playing_response",
            CyclePhase::CrossfadingToIdle => "crossfading_to_idle",
        }
    }
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CyclePhase::Idle => write!(f, "Idle"),
            CyclePhase::AwaitingSynthesis => write!(f, "Awaiting synthesis"),
            CyclePhase::LoadingResponse => write!(f, "Loading response"),
            CyclePhase::CrossfadingToResponse => write!(f, "Crossfading to response"),
            CyclePhase::PlayingResponse => write!(f, "Playing response"),
            CyclePhase::CrossfadingToIdle => write!(f, "Crossfading to idle"),
        }
    }
}

impl std::str::FromStr for CyclePhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let phase = match s {
            "idle" => CyclePhase::Idle,
            "awaiting_synthesis" => CyclePhase::AwaitingSynthesis,
            "loading_response" => CyclePhase::LoadingResponse,
            "crossfading_to_response" => CyclePhase::CrossfadingToResponse,
            "playing_response" => CyclePhase::PlayingResponse,
            "crossfading_to_idle" => CyclePhase::CrossfadingToIdle,
            other => return Err(format!("unknown phase '{}'", other)),
        };
        Ok(phase)
    }
}

/// Notifications emitted by the controller
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerEvent {
    /// Phase transition
    PhaseChanged { from: CyclePhase, to: CyclePhase },
    /// Send arrived while a cycle was running and was dropped
    SendIgnored,
    /// A surface refused to play
    PlaybackFailed(MediaError),
    /// The response surface never became playable
    ResponseLoadFailed { error: MediaError, recovered: bool },
    /// Idle was seeked before fading back in
    IdleSeeked { position: Duration },
    /// A cycle was cancelled before completing
    CycleAborted { cycle: u64 },
    /// A cycle returned to idle
    CycleCompleted { cycle: u64 },
}

/// Point-in-time copy of the controller state
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerSnapshot {
    pub phase: CyclePhase,
    pub is_processing: bool,
    pub send_enabled: bool,
    pub has_triggered_idle_crossfade: bool,
    pub idle: VisualLayer,
    pub response: VisualLayer,
    pub idle_position: Duration,
    pub response_position: Duration,
    pub response_duration: Duration,
    pub cycles_completed: u64,
    pub pending_timers: usize,
}

impl ControllerSnapshot {
    /// Neither layer is mid-fade
    pub fn no_fading_in(&self) -> bool {
        !self.idle.fading_in && !self.response.fading_in
    }

    /// Terminal resting flags: idle active, nothing fading
    pub fn is_at_rest(&self) -> bool {
        self.phase.is_idle() && self.idle.active && self.no_fading_in()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names_round_trip_for_scenarios() {
        for phase in [
            CyclePhase::Idle,
            CyclePhase::AwaitingSynthesis,
            CyclePhase::LoadingResponse,
            CyclePhase::CrossfadingToResponse,
            CyclePhase::PlayingResponse,
            CyclePhase::CrossfadingToIdle,
        ] {
            assert_eq!(phase.as_str().parse::<CyclePhase>(), Ok(phase));
        }
        assert!("speaking".parse::<CyclePhase>().is_err());
    }

    #[test]
    fn test_response_on_stage() {
        assert!(CyclePhase::PlayingResponse.is_response_on_stage());
        assert!(CyclePhase::CrossfadingToResponse.is_response_on_stage());
        assert!(!CyclePhase::AwaitingSynthesis.is_response_on_stage());
        assert!(!CyclePhase::CrossfadingToIdle.is_response_on_stage());
    }
}
