//! Crossfade controller
//!
//! Drives one send cycle at a time: wait out the synthesis delay, bring the
//! response surface up over the idle loop, and fade back to idle just before
//! the response ends.
//!
//! Everything runs on the caller's thread. The owner calls [`send`] when the
//! user asks for a response and [`update`] once per frame; `update` drains
//! surface signals, polls the pending load and runs due continuations.
//!
//! [`send`]: CrossfadeController::send
//! [`update`]: CrossfadeController::update

mod scheduler;
mod state;

pub use scheduler::{Scheduler, TimerId};
pub use state::{ControllerEvent, ControllerSnapshot, CyclePhase};

use crate::config::{AvatarConfig, TimingConfig};
use crate::media::{LoadFuture, MediaSurface, SimulatedSurface, SurfaceEvent};
use crate::MediaError;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Capacity of each observer channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Work scheduled to run after a delay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Continuation {
    /// Synthesis delay elapsed, start loading the response
    SynthesisElapsed,
    /// Response has fully faded in, drop idle's active flag
    RetireIdleLayer,
    /// Idle has fully faded back in, close the cycle
    FinishIdleCrossfade,
}

/// Controller for the idle/response crossfade cycle
pub struct CrossfadeController<S: MediaSurface = SimulatedSurface> {
    timing: TimingConfig,
    reset_on_load_failure: bool,
    idle: S,
    response: S,
    phase: CyclePhase,
    is_processing: bool,
    has_triggered_idle_crossfade: bool,
    scheduler: Scheduler<Continuation>,
    /// Continuations scheduled by the running cycle
    cycle_timers: Vec<TimerId>,
    pending_load: Option<LoadFuture>,
    rng: StdRng,
    observers: Vec<Sender<ControllerEvent>>,
    cycle: u64,
    cycles_completed: u64,
}

impl CrossfadeController<SimulatedSurface> {
    /// Build a controller over simulated surfaces shaped by `config.media`
    pub fn simulated(config: &AvatarConfig) -> Self {
        let media = &config.media;

        let idle = SimulatedSurface::new("idle", media.idle_duration()).looping(true);

        let mut response = SimulatedSurface::new("response", media.response_duration())
            .with_load_latency(media.response_load_latency())
            .unbuffered();
        response.set_fail_loads(media.fail_response_load);

        let mut controller = Self::new(config, idle, response);
        controller.idle.set_reject_play(media.reject_autoplay);
        controller.response.set_reject_play(media.reject_autoplay);
        controller
    }
}

impl<S: MediaSurface> CrossfadeController<S> {
    /// Create a controller; call [`start`](Self::start) before the first send
    pub fn new(config: &AvatarConfig, idle: S, response: S) -> Self {
        Self {
            timing: config.timing.clone(),
            reset_on_load_failure: config.recovery.reset_on_load_failure,
            idle,
            response,
            phase: CyclePhase::Idle,
            is_processing: false,
            has_triggered_idle_crossfade: false,
            scheduler: Scheduler::new(),
            cycle_timers: Vec::new(),
            pending_load: None,
            rng: StdRng::from_entropy(),
            observers: Vec::new(),
            cycle: 0,
            cycles_completed: 0,
        }
    }

    /// Use a fixed seed for the idle seek position
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Register an observer for controller events
    pub fn subscribe(&mut self) -> Receiver<ControllerEvent> {
        let (tx, rx) = bounded(EVENT_CHANNEL_CAPACITY);
        self.observers.push(tx);
        rx
    }

    /// Apply the transition duration to both layers and start the idle loop
    pub fn start(&mut self) {
        let transition = self.timing.crossfade();
        self.idle.visual_mut().transition = transition;
        self.response.visual_mut().transition = transition;
        self.idle.visual_mut().active = true;

        info!(
            synthesis_delay_ms = self.timing.synthesis_delay_ms,
            crossfade_ms = self.timing.crossfade_ms,
            lead_ms = self.timing.crossfade_lead_ms,
            "Crossfade controller started"
        );

        self.play_surface(SurfaceRole::Idle);
    }

    /// User asked for a response. Returns false if a cycle is already running.
    pub fn send(&mut self, now: Duration) -> bool {
        if self.is_processing {
            debug!(phase = %self.phase, "Send ignored, cycle already running");
            self.emit(ControllerEvent::SendIgnored);
            return false;
        }

        self.cycle += 1;
        self.is_processing = true;
        self.has_triggered_idle_crossfade = false;
        info!(cycle = self.cycle, "Send accepted");

        self.set_phase(CyclePhase::AwaitingSynthesis);
        self.schedule(now, self.timing.synthesis_delay(), Continuation::SynthesisElapsed);
        true
    }

    /// Response playback reached `position` of `duration`
    ///
    /// Starts the return crossfade the first time the remaining playback
    /// falls inside the lead window.
    pub fn handle_time_update(&mut self, now: Duration, position: Duration, duration: Duration) {
        if !self.is_processing
            || self.has_triggered_idle_crossfade
            || !self.phase.is_response_on_stage()
        {
            return;
        }

        let remaining = duration.saturating_sub(position);
        trace!(remaining_ms = remaining.as_millis() as u64, "Response time update");

        if !remaining.is_zero() && remaining <= self.timing.crossfade_lead() {
            self.has_triggered_idle_crossfade = true;
            self.crossfade_to_idle(now);
        }
    }

    /// Cooperative pump: surface signals, pending load, due continuations
    pub fn update(&mut self, now: Duration) {
        for event in self.idle.poll_events(now) {
            self.log_surface_event(SurfaceRole::Idle, &event);
        }

        for event in self.response.poll_events(now) {
            self.log_surface_event(SurfaceRole::Response, &event);
            if let SurfaceEvent::TimeUpdate { position, duration } = event {
                self.handle_time_update(now, position, duration);
            }
        }

        self.poll_pending_load(now);

        while let Some((id, task)) = self.scheduler.pop_due(now) {
            self.cycle_timers.retain(|pending| *pending != id);
            self.run(task, now);
        }
    }

    /// Cancel the running cycle and put idle back on stage
    ///
    /// Returns false when no cycle was running.
    pub fn abort_cycle(&mut self) -> bool {
        if !self.is_processing {
            return false;
        }

        warn!(cycle = self.cycle, phase = %self.phase, "Aborting cycle");
        self.return_to_idle();
        self.emit(ControllerEvent::CycleAborted { cycle: self.cycle });
        true
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// The send control is enabled exactly when no cycle is running
    pub fn send_enabled(&self) -> bool {
        !self.is_processing
    }

    pub fn has_triggered_idle_crossfade(&self) -> bool {
        self.has_triggered_idle_crossfade
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// Due time of the next scheduled continuation
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    pub fn idle(&self) -> &S {
        &self.idle
    }

    pub fn idle_mut(&mut self) -> &mut S {
        &mut self.idle
    }

    pub fn response(&self) -> &S {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut S {
        &mut self.response
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            phase: self.phase,
            is_processing: self.is_processing,
            send_enabled: self.send_enabled(),
            has_triggered_idle_crossfade: self.has_triggered_idle_crossfade,
            idle: *self.idle.visual(),
            response: *self.response.visual(),
            idle_position: self.idle.position(),
            response_position: self.response.position(),
            response_duration: self.response.duration(),
            cycles_completed: self.cycles_completed,
            pending_timers: self.scheduler.len(),
        }
    }

    fn schedule(&mut self, now: Duration, delay: Duration, task: Continuation) {
        let id = self.scheduler.schedule(now, delay, task);
        self.cycle_timers.push(id);
    }

    fn run(&mut self, task: Continuation, now: Duration) {
        trace!(?task, "Running continuation");
        match task {
            Continuation::SynthesisElapsed => self.begin_response_load(now),
            Continuation::RetireIdleLayer => {
                self.idle.visual_mut().active = false;
                if self.phase == CyclePhase::CrossfadingToResponse {
                    self.set_phase(CyclePhase::PlayingResponse);
                }
            }
            Continuation::FinishIdleCrossfade => self.finish_idle_crossfade(),
        }
    }

    fn begin_response_load(&mut self, now: Duration) {
        self.set_phase(CyclePhase::LoadingResponse);
        self.response.set_position(Duration::ZERO);

        if self.response.ready_state().can_play() {
            self.crossfade_to_response(now);
            return;
        }

        debug!(ready_state = ?self.response.ready_state(), "Response not buffered, reloading");
        self.pending_load = Some(self.response.load());
    }

    fn poll_pending_load(&mut self, now: Duration) {
        let Some(load) = self.pending_load.as_mut() else {
            return;
        };
        let Some(result) = load.poll_now() else {
            return;
        };
        self.pending_load = None;

        match result {
            Ok(()) => {
                debug!("Response ready");
                self.crossfade_to_response(now);
            }
            Err(error) => self.handle_load_failure(error),
        }
    }

    fn crossfade_to_response(&mut self, now: Duration) {
        self.set_phase(CyclePhase::CrossfadingToResponse);

        // Idle stays fully visible underneath while the response fades in on top.
        self.play_surface(SurfaceRole::Response);
        self.response.visual_mut().fading_in = true;

        self.schedule(now, self.timing.crossfade(), Continuation::RetireIdleLayer);
    }

    fn crossfade_to_idle(&mut self, now: Duration) {
        self.set_phase(CyclePhase::CrossfadingToIdle);

        let idle_duration = self.idle.duration();
        let position = if idle_duration.is_zero() {
            Duration::ZERO
        } else {
            self.rng.gen_range(Duration::ZERO..idle_duration)
        };
        self.idle.set_position(position);
        debug!(position_ms = position.as_millis() as u64, "Idle seeked");
        self.emit(ControllerEvent::IdleSeeked { position });

        self.play_surface(SurfaceRole::Idle);
        self.idle.visual_mut().fading_in = true;

        self.schedule(now, self.timing.crossfade(), Continuation::FinishIdleCrossfade);
    }

    fn finish_idle_crossfade(&mut self) {
        self.response.visual_mut().fading_in = false;
        let idle = self.idle.visual_mut();
        idle.fading_in = false;
        idle.active = true;

        self.is_processing = false;
        self.cycles_completed += 1;
        self.set_phase(CyclePhase::Idle);

        info!(cycle = self.cycle, "Cycle completed");
        self.emit(ControllerEvent::CycleCompleted { cycle: self.cycle });
    }

    fn handle_load_failure(&mut self, error: MediaError) {
        error!(%error, "Response video failed to load");
        let recovered = self.reset_on_load_failure;
        self.emit(ControllerEvent::ResponseLoadFailed {
            error,
            recovered,
        });

        if recovered {
            self.return_to_idle();
        } else {
            warn!(cycle = self.cycle, "Cycle stalled, send stays disabled");
        }
    }

    fn return_to_idle(&mut self) {
        let dropped = self
            .cycle_timers
            .drain(..)
            .filter_map(|id| self.scheduler.cancel(id))
            .count();
        if self.pending_load.take().is_some() {
            debug!("Dropped pending response load");
        }
        debug!(dropped, "Cancelled pending continuations");

        self.response.pause();
        self.response.visual_mut().fading_in = false;
        let idle = self.idle.visual_mut();
        idle.fading_in = false;
        idle.active = true;
        if !self.idle.is_playing() {
            self.play_surface(SurfaceRole::Idle);
        }

        self.is_processing = false;
        self.set_phase(CyclePhase::Idle);
    }

    fn play_surface(&mut self, role: SurfaceRole) {
        let surface = match role {
            SurfaceRole::Idle => &mut self.idle,
            SurfaceRole::Response => &mut self.response,
        };
        if let Err(error) = surface.play() {
            error!(%error, "Error playing {} video", role);
            self.emit(ControllerEvent::PlaybackFailed(error));
        }
    }

    fn set_phase(&mut self, to: CyclePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        debug!(cycle = self.cycle, %from, %to, "Phase changed");
        self.emit(ControllerEvent::PhaseChanged { from, to });
    }

    fn emit(&mut self, event: ControllerEvent) {
        self.observers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                trace!("Observer channel full, dropping event");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    fn log_surface_event(&self, role: SurfaceRole, event: &SurfaceEvent) {
        match event {
            SurfaceEvent::CanPlay => debug!(surface = %role, "Can play"),
            SurfaceEvent::Error(error) => warn!(surface = %role, %error, "Surface error"),
            SurfaceEvent::Ended => debug!(surface = %role, "Playback ended"),
            SurfaceEvent::TimeUpdate { .. } => {}
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum SurfaceRole {
    Idle,
    Response,
}

impl std::fmt::Display for SurfaceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceRole::Idle => write!(f, "idle"),
            SurfaceRole::Response => write!(f, "response"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn controller() -> CrossfadeController {
        let config = AvatarConfig::default().with_response_duration(5000);
        let mut controller = CrossfadeController::simulated(&config).with_seed(7);
        controller.start();
        controller
    }

    #[test]
    fn test_start_puts_idle_on_stage() {
        let controller = controller();
        let snapshot = controller.snapshot();

        assert!(snapshot.is_at_rest());
        assert_eq!(snapshot.idle.transition, ms(300));
        assert_eq!(snapshot.response.transition, ms(300));
        assert!(controller.idle().is_playing());
        assert!(snapshot.send_enabled);
    }

    #[test]
    fn test_send_enters_awaiting_synthesis() {
        let mut controller = controller();
        controller.update(ms(0));

        assert!(controller.send(ms(0)));
        assert_eq!(controller.phase(), CyclePhase::AwaitingSynthesis);
        assert!(controller.is_processing());
        assert!(!controller.send_enabled());
        assert_eq!(controller.next_deadline(), Some(ms(1000)));
    }

    #[test]
    fn test_second_send_is_dropped() {
        let mut controller = controller();
        let events = controller.subscribe();
        controller.send(ms(0));
        let before = controller.snapshot();

        assert!(!controller.send(ms(500)));
        assert_eq!(controller.snapshot(), before);
        assert!(events.try_iter().any(|e| e == ControllerEvent::SendIgnored));
    }

    #[test]
    fn test_synthesis_delay_starts_load() {
        let mut controller = controller();
        controller.update(ms(0));
        controller.send(ms(0));

        controller.update(ms(999));
        assert_eq!(controller.phase(), CyclePhase::AwaitingSynthesis);

        controller.update(ms(1000));
        assert_eq!(controller.phase(), CyclePhase::LoadingResponse);
        assert!(controller.response().has_pending_load());
    }

    #[test]
    fn test_time_update_ignored_outside_cycle() {
        let mut controller = controller();
        controller.handle_time_update(ms(0), ms(4700), ms(5000));

        assert!(!controller.has_triggered_idle_crossfade());
        assert!(controller.phase().is_idle());
    }

    #[test]
    fn test_abort_cancels_pending_work() {
        let mut controller = controller();
        let events = controller.subscribe();
        controller.send(ms(0));

        assert!(controller.abort_cycle());
        assert!(controller.snapshot().is_at_rest());
        assert!(controller.send_enabled());
        assert_eq!(controller.next_deadline(), None);
        assert_eq!(controller.snapshot().pending_timers, 0);
        assert!(events
            .try_iter()
            .any(|e| e == ControllerEvent::CycleAborted { cycle: 1 }));

        // Nothing left to fire
        controller.update(ms(2000));
        assert!(controller.phase().is_idle());
        assert!(!controller.abort_cycle());
    }

    #[test]
    fn test_rejected_idle_play_is_reported_not_fatal() {
        let config = AvatarConfig {
            media: crate::config::MediaConfig {
                reject_autoplay: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut controller = CrossfadeController::simulated(&config);
        let events = controller.subscribe();
        controller.start();

        assert!(!controller.idle().is_playing());
        assert!(controller.snapshot().is_at_rest());
        assert!(matches!(
            events.try_recv(),
            Ok(ControllerEvent::PlaybackFailed(MediaError::PlaybackRejected { .. }))
        ));
    }
}
