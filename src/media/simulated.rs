//! Clock-driven in-memory playback surface
//!
//! Stands in for a decoded video: it keeps a position that advances with the
//! caller's clock, buffers for a fixed latency after a reload, and can be
//! told to fail loads or reject playback.

use super::{LoadCompleter, LoadFuture, MediaSurface, ReadyState, SurfaceEvent, VisualLayer};
use crate::MediaError;
use std::time::Duration;
use tracing::{debug, trace};

/// Longest stretch of playback covered by a single time update
pub const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug)]
struct PendingLoad {
    completer: LoadCompleter,
    started_at: Option<Duration>,
}

/// Simulated media surface
#[derive(Debug)]
pub struct SimulatedSurface {
    name: String,
    duration: Duration,
    position: Duration,
    playing: bool,
    looping: bool,
    ready_state: ReadyState,
    load_latency: Duration,
    fail_loads: bool,
    fail_next_load: bool,
    reject_play: bool,
    pending_load: Option<PendingLoad>,
    last_poll: Option<Duration>,
    visual: VisualLayer,
}

impl SimulatedSurface {
    /// Create a fully buffered, non-looping surface
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            duration,
            position: Duration::ZERO,
            playing: false,
            looping: false,
            ready_state: ReadyState::HaveEnoughData,
            load_latency: Duration::ZERO,
            fail_loads: false,
            fail_next_load: false,
            reject_play: false,
            pending_load: None,
            last_poll: None,
            visual: VisualLayer::default(),
        }
    }

    /// Wrap around at the end instead of stopping
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Time a reload needs before the surface can play
    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    /// Start with only metadata buffered so the first load goes to the network
    pub fn unbuffered(mut self) -> Self {
        self.ready_state = ReadyState::HaveMetadata;
        self
    }

    pub fn set_fail_loads(&mut self, fail: bool) {
        self.fail_loads = fail;
    }

    pub fn set_reject_play(&mut self, reject: bool) {
        self.reject_play = reject;
    }

    /// Drop buffered data and make the reload that follows fail once
    pub fn inject_load_failure(&mut self) {
        self.ready_state = ReadyState::HaveMetadata;
        self.fail_next_load = true;
    }

    pub fn has_pending_load(&self) -> bool {
        self.pending_load.is_some()
    }

    fn finish_load(&mut self, now: Duration, events: &mut Vec<SurfaceEvent>) {
        let Some(pending) = self.pending_load.as_mut() else {
            return;
        };
        let started_at = *pending.started_at.get_or_insert(now);
        if now.saturating_sub(started_at) < self.load_latency {
            return;
        }

        let Some(pending) = self.pending_load.take() else {
            return;
        };
        if self.fail_loads || std::mem::take(&mut self.fail_next_load) {
            let reason = "source could not be decoded";
            debug!(surface = %self.name, "Load failed");
            events.push(SurfaceEvent::Error(MediaError::LoadFailed {
                surface: self.name.clone(),
                reason: reason.to_string(),
            }));
            pending.completer.fail(reason);
        } else {
            self.ready_state = ReadyState::HaveEnoughData;
            debug!(surface = %self.name, "Can play");
            events.push(SurfaceEvent::CanPlay);
            pending.completer.resolve();
        }
    }

    fn advance(&mut self, elapsed: Duration, events: &mut Vec<SurfaceEvent>) {
        if !self.playing || !self.ready_state.can_play() {
            return;
        }

        // A long gap between polls still reports every intermediate position.
        let mut left = elapsed;
        while !left.is_zero() {
            let step = left.min(TIME_UPDATE_INTERVAL);
            left -= step;

            let mut position = self.position + step;
            let mut ended = false;
            if position >= self.duration {
                if self.looping && !self.duration.is_zero() {
                    let wrapped = position.as_nanos() % self.duration.as_nanos();
                    position = Duration::from_nanos(wrapped as u64);
                } else {
                    position = self.duration;
                    self.playing = false;
                    ended = true;
                }
            }
            self.position = position;

            trace!(surface = %self.name, position_ms = position.as_millis() as u64, "Time update");
            events.push(SurfaceEvent::TimeUpdate {
                position,
                duration: self.duration,
            });
            if ended {
                events.push(SurfaceEvent::Ended);
                break;
            }
        }
    }
}

impl MediaSurface for SimulatedSurface {
    fn name(&self) -> &str {
        &self.name
    }

    fn play(&mut self) -> Result<(), MediaError> {
        if self.reject_play {
            return Err(MediaError::PlaybackRejected {
                surface: self.name.clone(),
                reason: "play() requires a user gesture".to_string(),
            });
        }
        if !self.looping && self.position >= self.duration {
            self.position = Duration::ZERO;
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn load(&mut self) -> LoadFuture {
        if self.pending_load.is_some() {
            debug!(surface = %self.name, "Replacing pending load");
        }
        let (completer, future) = LoadFuture::pending(self.name.clone());
        self.pending_load = Some(PendingLoad {
            completer,
            started_at: None,
        });
        self.ready_state = ReadyState::HaveNothing;
        self.position = Duration::ZERO;
        self.playing = false;
        future
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn set_position(&mut self, position: Duration) {
        self.position = position.min(self.duration);
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn visual(&self) -> &VisualLayer {
        &self.visual
    }

    fn visual_mut(&mut self) -> &mut VisualLayer {
        &mut self.visual
    }

    fn poll_events(&mut self, now: Duration) -> Vec<SurfaceEvent> {
        let elapsed = self
            .last_poll
            .map(|last| now.saturating_sub(last))
            .unwrap_or(Duration::ZERO);
        self.last_poll = Some(now);

        let mut events = Vec::new();
        self.finish_load(now, &mut events);
        self.advance(elapsed, &mut events);
        events
    }
}
