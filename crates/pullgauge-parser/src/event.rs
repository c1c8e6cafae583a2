use std::fmt;

/// Reserved status that asks the engine to render a snapshot without
/// mutating any state. Never produced by docker itself.
pub const PRINT_MARKER: &str = "PRINT";

/// One layer status change lifted from a single line of docker output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusEvent {
    pub layer_name: String,
    pub status: String,
}

impl StatusEvent {
    pub fn new(layer_name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            layer_name: layer_name.into(),
            status: status.into(),
        }
    }

    /// Marker event used by periodic-snapshot producers. Carries no layer,
    /// so it never disturbs the "last seen" field.
    pub fn print_marker() -> Self {
        Self {
            layer_name: String::new(),
            status: PRINT_MARKER.to_string(),
        }
    }
}

/// Which side of a transfer the input stream describes. Decides only which
/// counter set a snapshot reports; classification itself is format-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamFormat {
    #[default]
    Pull,
    Push,
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamFormat::Pull => write!(f, "pull"),
            StreamFormat::Push => write!(f, "push"),
        }
    }
}
