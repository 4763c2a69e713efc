//! NFC tap session: state machine, controller and listener registry.

mod controller;
mod listeners;
mod state;

pub use controller::{SessionController, TapEvent};
pub use listeners::Subscription;
pub use state::SessionState;
