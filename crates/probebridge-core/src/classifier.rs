//! Line classification for debug bridge output.
//!
//! The bridge only speaks free-form text. [`OutputClassifier`] maps one line at
//! a time onto an [`OutputEvent`] using an ordered rule table; the first rule
//! that matches wins. The table is data, so hosts with a different bridge
//! build can swap it out with [`OutputClassifier::with_rules`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// What a single output line means to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputEvent {
    /// The bridge accepts remote debugger connections.
    Ready,
    /// USB transfer failure talking to the adapter.
    HardwareIoError,
    /// The adapter vanished from the bus.
    DeviceDisconnected,
    /// TDO is stuck high; usually recovers after a restart.
    StuckSignal,
    /// The remote-protocol port is already bound.
    PortBusy,
    /// Instruction register capture failed.
    ProtocolError,
    /// Anything else.
    Informational,
}

impl OutputEvent {
    /// Operator hints written to the session log when the event fires.
    pub const fn hints(self) -> &'static [&'static str] {
        match self {
            Self::HardwareIoError => &[
                "maybe: no permission to access the adapter",
                "maybe: the adapter is used by another program",
                "maybe: the USB driver is not valid (windows)",
            ],
            Self::ProtocolError => &["maybe: VRef is wrong", "maybe: target power failed"],
            Self::DeviceDisconnected => &["maybe: the adapter was unplugged"],
            Self::PortBusy => &["the port will be chosen automatically next time"],
            Self::Ready | Self::StuckSignal | Self::Informational => &[],
        }
    }

    /// User-facing summary for faults.
    pub const fn summary(self) -> Option<&'static str> {
        match self {
            Self::HardwareIoError => Some("Connection failed."),
            Self::ProtocolError => {
                Some("Failed to communicate with cpu, please check your connection.")
            }
            Self::DeviceDisconnected => Some("Debug adapter disconnected."),
            Self::StuckSignal => Some("TDO seems to be stuck high."),
            Self::PortBusy => Some("Debug port is already in use."),
            Self::Ready | Self::Informational => None,
        }
    }

    pub const fn is_fault(self) -> bool {
        !matches!(self, Self::Ready | Self::Informational)
    }
}

/// One entry of the rule table.
#[derive(Debug, Clone)]
pub struct ClassifierRule {
    pub pattern: Regex,
    pub event: OutputEvent,
}

impl ClassifierRule {
    pub fn new(pattern: &str, event: OutputEvent) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            event,
        })
    }
}

/// Built-in signatures, in priority order.
const STANDARD_PATTERNS: &[(&str, OutputEvent)] = &[
    (r"\bLIBUSB_ERROR_IO\b", OutputEvent::HardwareIoError),
    (r"\bLIBUSB_ERROR_NO_DEVICE\b", OutputEvent::DeviceDisconnected),
    (r"\bTDO seems to be stuck high\b", OutputEvent::StuckSignal),
    (r"(?i)\bready for remote connections\b", OutputEvent::Ready),
    (r" IR capture error; saw ", OutputEvent::ProtocolError),
    (
        r"couldn't bind .+ to socket on port|(?i)address already in use",
        OutputEvent::PortBusy,
    ),
];

#[allow(clippy::expect_used)]
static STANDARD_RULES: LazyLock<Vec<ClassifierRule>> = LazyLock::new(|| {
    STANDARD_PATTERNS
        .iter()
        .map(|(pattern, event)| {
            ClassifierRule::new(pattern, *event).expect("built-in classifier pattern compiles")
        })
        .collect()
});

/// Stateless line classifier.
#[derive(Debug, Clone)]
pub struct OutputClassifier {
    rules: Vec<ClassifierRule>,
}

impl OutputClassifier {
    /// The built-in OpenOCD rule table.
    pub fn standard() -> Self {
        Self {
            rules: STANDARD_RULES.clone(),
        }
    }

    /// A classifier with a caller-supplied table.
    pub const fn with_rules(rules: Vec<ClassifierRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    /// Classify one complete line.
    pub fn classify(&self, line: &str) -> OutputEvent {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(line))
            .map_or(OutputEvent::Informational, |rule| rule.event)
    }
}

impl Default for OutputClassifier {
    fn default() -> Self {
        Self::standard()
    }
}
