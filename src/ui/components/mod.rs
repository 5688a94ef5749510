//! UI components
//!
//! Reusable pieces of the avatar window.

pub mod debug_panel;
pub mod send_button;
pub mod stage;

pub use debug_panel::DebugPanel;
pub use send_button::{SendButton, SEND_BUTTON_LABEL};
pub use stage::Stage;
