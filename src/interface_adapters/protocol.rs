// Wire protocol DTOs for the public WebSocket messages.

use crate::domain::Role;
use crate::use_cases::SanitizedClient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Full roster replacement, sent to authors on any connect or disconnect.
    ReplaceClients { clients: Vec<ClientInfoDto> },
    /// Full options snapshot, sent once to a newly active connection.
    ReplaceOptions { options: Map<String, Value> },
    /// Single-field change relay.
    UpdateOption { key: String, value: Value },
}

/// Messages clients send to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Apply one field and rebroadcast to everyone but the sender.
    UpdateOption { key: String, value: Value },
    /// Scroll-progress report; applied to `percent` and relayed to authors.
    UpdatePercent { value: Value },
}

/// Roster entry as serialized to authors; carries no transport handles.
#[derive(Debug, Clone, Serialize)]
pub struct ClientInfoDto {
    pub id: u64,
    pub ip: String,
    pub joined: u64,
    #[serde(rename = "type")]
    pub role: Role,
    /// Reserved for wire compatibility; omitted while unpopulated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl From<SanitizedClient> for ClientInfoDto {
    fn from(client: SanitizedClient) -> Self {
        Self {
            id: client.id,
            ip: client.identity,
            joined: client.joined_at,
            role: client.role,
            status: client.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn when_roster_serialized_then_wire_shape_matches_protocol() {
        let message = ServerMessage::ReplaceClients {
            clients: vec![ClientInfoDto {
                id: 3,
                ip: "127.0.0.1:9000".to_string(),
                joined: 1700000000,
                role: Role::Author,
                status: None,
            }],
        };

        let wire = serde_json::to_value(&message).expect("serialize");

        assert_eq!(
            wire,
            json!({
                "type": "replaceClients",
                "clients": [{
                    "id": 3,
                    "ip": "127.0.0.1:9000",
                    "joined": 1700000000u64,
                    "type": "telemaster"
                }]
            })
        );
    }

    #[test]
    fn when_update_option_parsed_then_key_and_value_survive() {
        let parsed: ClientMessage =
            serde_json::from_value(json!({"type": "updateOption", "key": "fontSize", "value": 64}))
                .expect("parse");

        match parsed {
            ClientMessage::UpdateOption { key, value } => {
                assert_eq!(key, "fontSize");
                assert_eq!(value, json!(64));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn when_tag_is_unknown_then_parse_fails_for_caller_to_ignore() {
        let result = serde_json::from_value::<ClientMessage>(json!({"type": "mystery"}));
        assert!(result.is_err());
    }
}
