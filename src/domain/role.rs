use serde::{Deserialize, Serialize};

/// Connection role, declared once at connect time via the WebSocket
/// sub-protocol and immutable for the connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Reading client scrolling the script (`teleprompter` sub-protocol).
    #[serde(rename = "teleprompter")]
    Display,
    /// Authoring client controlling the session (`telemaster` sub-protocol).
    #[serde(rename = "telemaster")]
    Author,
}

impl Role {
    /// Maps a negotiated sub-protocol name to a role.
    pub fn from_protocol(protocol: &str) -> Option<Self> {
        match protocol {
            "teleprompter" => Some(Role::Display),
            "telemaster" => Some(Role::Author),
            _ => None,
        }
    }

    pub fn as_protocol(self) -> &'static str {
        match self {
            Role::Display => "teleprompter",
            Role::Author => "telemaster",
        }
    }
}
