//! Desktop UI
//!
//! egui/eframe window with the video stage, the send button and a debug panel.

mod app;
pub mod components;
mod state;
mod theme;

pub use app::AvatarApp;
pub use components::{DebugPanel, SendButton, Stage, SEND_BUTTON_LABEL};
pub use state::{AppState, DebugInfo};
pub use theme::Theme;
