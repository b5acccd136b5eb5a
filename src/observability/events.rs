//! Observable lifecycle events
//!
//! Events are explicit and typed; each one is logged under a stable
//! SCREAMING_SNAKE_CASE name in the `event` field.

use std::fmt;

use tracing::Level;

/// Observable events in pqlmock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Data directories created by `init`
    Initialized,
    /// Session ready for requests
    Serving,
    /// Session reached end of input
    ShutdownComplete,

    // Requests
    /// Request line read
    RequestReceived,
    /// Request line could not be decoded
    RequestRejected,
    /// Schema evaluated successfully
    RenderComplete,
    /// Schema evaluation failed
    RenderFailed,
    /// Stored example expanded
    ExampleExpanded,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Initialized => "INITIALIZED",
            Event::Serving => "SERVING",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::RequestReceived => "REQUEST_RECEIVED",
            Event::RequestRejected => "REQUEST_REJECTED",
            Event::RenderComplete => "RENDER_COMPLETE",
            Event::RenderFailed => "RENDER_FAILED",
            Event::ExampleExpanded => "EXAMPLE_EXPANDED",
        }
    }

    /// Level the event is logged at
    pub fn level(&self) -> Level {
        match self {
            Event::RequestRejected | Event::RenderFailed => Level::WARN,
            Event::RequestReceived | Event::RenderComplete | Event::ExampleExpanded => {
                Level::DEBUG
            }
            _ => Level::INFO,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::ConfigLoaded.as_str(), "CONFIG_LOADED");
        assert_eq!(Event::RenderFailed.to_string(), "RENDER_FAILED");
    }

    #[test]
    fn test_failures_are_warnings() {
        assert_eq!(Event::RenderFailed.level(), Level::WARN);
        assert_eq!(Event::RequestRejected.level(), Level::WARN);
        assert_eq!(Event::Serving.level(), Level::INFO);
    }
}
