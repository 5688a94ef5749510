//! Application state for the avatar window
//!
//! Owns the crossfade controller and collects its events for the debug panel.

use crate::config::AvatarConfig;
use crate::controller::{ControllerEvent, CrossfadeController};
use crate::AvatarError;
use crossbeam_channel::Receiver;
use std::collections::VecDeque;
use std::time::Duration;

const LOG_CAPACITY: usize = 100;

/// Debug information displayed in the debug panel
#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    /// Current frame rate
    pub fps: f32,
    /// Recent controller events, oldest first
    pub log_messages: VecDeque<String>,
}

impl DebugInfo {
    pub fn new() -> Self {
        Self {
            log_messages: VecDeque::with_capacity(LOG_CAPACITY),
            ..Default::default()
        }
    }

    pub fn add_log(&mut self, message: String) {
        if self.log_messages.len() >= LOG_CAPACITY {
            self.log_messages.pop_front();
        }
        self.log_messages.push_back(message);
    }
}

/// State shared by all UI components
pub struct AppState {
    pub controller: CrossfadeController,
    events: Receiver<ControllerEvent>,
    pub debug_info: DebugInfo,
    pub show_debug_panel: bool,
    /// Last failure worth showing to the user
    pub last_error: Option<String>,
}

impl AppState {
    /// Build simulated surfaces from `config` and start the idle loop
    pub fn new(config: &AvatarConfig) -> Self {
        let mut controller = CrossfadeController::simulated(config);
        let events = controller.subscribe();
        controller.start();

        let mut state = Self {
            controller,
            events,
            debug_info: DebugInfo::new(),
            show_debug_panel: true,
            last_error: None,
        };
        state.drain_events(Duration::ZERO);
        state
    }

    /// Handle a click on the send button
    pub fn send_message(&mut self, now: Duration) -> bool {
        let accepted = self.controller.send(now);
        if accepted {
            self.last_error = None;
        }
        self.drain_events(now);
        accepted
    }

    /// Pump the controller and collect what it reported
    pub fn poll_events(&mut self, now: Duration) {
        self.controller.update(now);
        self.drain_events(now);
    }

    pub fn update_fps(&mut self, delta_secs: f64) {
        if delta_secs > 0.0 {
            let fps = (1.0 / delta_secs) as f32;
            // Smooth out frame-to-frame jitter
            self.debug_info.fps = self.debug_info.fps * 0.9 + fps * 0.1;
        }
    }

    fn drain_events(&mut self, now: Duration) {
        while let Ok(event) = self.events.try_recv() {
            let line = match &event {
                ControllerEvent::PhaseChanged { from, to } => format!("{} → {}", from, to),
                ControllerEvent::SendIgnored => "Send ignored while responding".to_string(),
                ControllerEvent::PlaybackFailed(error) => {
                    self.last_error = Some(AvatarError::from(error.clone()).user_message());
                    format!("Playback failed: {}", error)
                }
                ControllerEvent::ResponseLoadFailed { error, recovered } => {
                    self.last_error = Some(AvatarError::from(error.clone()).user_message());
                    if *recovered {
                        format!("Load failed, back to idle: {}", error)
                    } else {
                        format!("Load failed, stalled: {}", error)
                    }
                }
                ControllerEvent::IdleSeeked { position } => {
                    format!("Idle seeked to {:.2}s", position.as_secs_f64())
                }
                ControllerEvent::CycleAborted { cycle } => format!("Cycle {} aborted", cycle),
                ControllerEvent::CycleCompleted { cycle } => format!("Cycle {} completed", cycle),
            };
            self.debug_info
                .add_log(format!("[{:>7.2}s] {}", now.as_secs_f64(), line));
        }
    }
}
