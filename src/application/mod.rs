//! Application layer - Use cases and port interfaces
//!
//! Contains the push detection pipeline (detectors, dispatcher, trigger,
//! presenter) and the trait definitions for external system interactions.

pub mod bridge;
pub mod context;
pub mod detection;
pub mod notification;
pub mod ports;
pub mod trigger;
pub mod wrappers;

// Re-export use cases
pub use bridge::{GitIntegrationBridge, BRIDGE_API_VERSION};
pub use context::PushContext;
pub use detection::DetectorSet;
pub use notification::NotificationPresenter;
pub use trigger::{PushTrigger, DEBOUNCE_DELAY};
pub use wrappers::{CommandWrapper, CommandWrappers, PUSH_COMMANDS};
