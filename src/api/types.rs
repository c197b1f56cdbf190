// Game server API types.
// Defines the game snapshot returned by the server and the request bodies sent to it.

use serde::{Deserialize, Serialize};

/// Numeric user id assigned by the game server.
pub type UserId = u64;

/// Phase of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    #[default]
    Waiting,
    Started,
    #[serde(rename = "roundfinish")]
    RoundFinished,
    #[serde(rename = "playfinal")]
    PlayFinal,
    #[serde(rename = "gamefinish")]
    GameFinished,
    #[serde(other)]
    Unknown,
}

impl GameState {
    pub fn display(&self) -> &'static str {
        match self {
            GameState::Waiting => "Warteraum",
            GameState::Started => "Runde läuft",
            GameState::RoundFinished => "Runde beendet",
            GameState::PlayFinal => "Finale",
            GameState::GameFinished => "Spiel beendet",
            GameState::Unknown => "Unbekannt",
        }
    }
}

/// A player in a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "Id")]
    pub id: UserId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Chips", default)]
    pub chips: i64,
    #[serde(rename = "Passive", default)]
    pub passive: bool,
    #[serde(rename = "Halfcount", default)]
    pub half_count: i64,
    #[serde(rename = "Finalcount", default)]
    pub final_count: i64,
    #[serde(rename = "Number_Dice", default)]
    pub number_dice: i64,
    #[serde(rename = "Is_Admin", default)]
    pub is_admin: bool,
    #[serde(rename = "Leave_After_Game", default)]
    pub leave_after_game: bool,
    #[serde(rename = "Pending_Join", default)]
    pub pending_join: bool,
}

/// A single scoring rule of a ruleset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default)]
    pub dice: Option<u32>,
    /// Chips this throw costs; `-1` marks the "schockaus" rule.
    pub chips: i64,
}

impl Rule {
    pub fn is_schockaus(&self) -> bool {
        self.chips == -1
    }
}

/// Ruleset attached to a running game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub stack_max: Option<u32>,
    #[serde(default)]
    pub play_final: bool,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Ruleset {
    /// Name of the rule that moves all chips at once, if the ruleset has one.
    pub fn schockaus_name(&self) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.is_schockaus())
            .map(|rule| rule.name.as_str())
    }
}

/// Full game snapshot as served by `GET /api/game/{id}` and the join endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    #[serde(rename = "Stack_Max", default)]
    pub stack_max: u32,
    #[serde(rename = "Stack", default)]
    pub stack: i64,
    #[serde(rename = "State", default)]
    pub state: GameState,
    #[serde(rename = "Move", default)]
    pub move_user: Option<i64>,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
    #[serde(rename = "First", default)]
    pub first_user: Option<i64>,
    #[serde(rename = "Admins", default)]
    pub admins: Vec<UserId>,
    #[serde(rename = "Game_Half_Count", default)]
    pub half_count: Option<i64>,
    #[serde(rename = "Game_Final_Count", default)]
    pub final_count: Option<i64>,
    #[serde(rename = "Lobby_After_Game", default)]
    pub lobby_after_game: bool,
    #[serde(rename = "Falling_Dice", default)]
    pub falling_dice: bool,
    #[serde(rename = "Ruleset_Id", default)]
    pub ruleset_id: Option<String>,
    #[serde(rename = "User", default)]
    pub users: Vec<User>,
    #[serde(rename = "Reveal_Votes", default)]
    pub reveal_votes: u32,
    #[serde(rename = "Ruleset", default)]
    pub ruleset: Option<Ruleset>,
}

impl Game {
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admins.contains(&user_id)
    }

    pub fn user(&self, user_id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    /// Players that already take part in the game (not queued for the next one).
    pub fn joined_users(&self) -> impl Iterator<Item = &User> {
        self.users.iter().filter(|u| !u.pending_join)
    }
}

/// Message body the server attaches to most responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerMessage {
    #[serde(rename = "Message")]
    pub message: Option<String>,
}

impl ServerMessage {
    /// Extract `Message` from a response body. `None` if the body is not a JSON
    /// object or carries no message.
    pub fn parse(body: &str) -> Option<String> {
        serde_json::from_str::<ServerMessage>(body)
            .ok()
            .and_then(|m| m.message)
    }
}

/// Body for admin actions attributed via `admin_id`.
#[derive(Debug, Clone, Serialize)]
pub struct AdminBody {
    pub admin_id: UserId,
}

/// Body for actions attributed via `requester_id`.
#[derive(Debug, Clone, Serialize)]
pub struct RequesterBody {
    pub requester_id: UserId,
}

/// Empty JSON object body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyBody {}

/// Where a chip transfer takes its chips from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSource {
    Stack,
    Schockaus,
    Player(UserId),
}

impl TransferSource {
    pub const STACK_VALUE: &'static str = "stack";
    pub const SCHOCKAUS_VALUE: &'static str = "schockaus";

    /// Parse the value of a transfer-source select option.
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            Self::STACK_VALUE => Some(TransferSource::Stack),
            Self::SCHOCKAUS_VALUE => Some(TransferSource::Schockaus),
            other => other.parse().ok().map(TransferSource::Player),
        }
    }

    pub fn value(&self) -> String {
        match self {
            TransferSource::Stack => Self::STACK_VALUE.to_string(),
            TransferSource::Schockaus => Self::SCHOCKAUS_VALUE.to_string(),
            TransferSource::Player(id) => id.to_string(),
        }
    }
}

/// A manual chip transfer requested by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipTransfer {
    pub source: TransferSource,
    pub target: UserId,
    pub count: u32,
}

impl ChipTransfer {
    /// Wire body for this transfer; the variant is chosen by the source mode.
    pub fn body(&self, admin_id: UserId) -> TransferBody {
        match self.source {
            TransferSource::Stack => TransferBody::FromStack {
                count: self.count,
                stack: true,
                target: self.target,
                admin_id,
            },
            TransferSource::Schockaus => TransferBody::Schockaus {
                schockaus: true,
                target: self.target,
                admin_id,
            },
            TransferSource::Player(source) => TransferBody::FromPlayer {
                count: self.count,
                source,
                target: self.target,
                admin_id,
            },
        }
    }
}

/// Request body of `POST /api/game/{id}/user/chips`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TransferBody {
    FromStack {
        count: u32,
        stack: bool,
        target: UserId,
        admin_id: UserId,
    },
    Schockaus {
        schockaus: bool,
        target: UserId,
        admin_id: UserId,
    },
    FromPlayer {
        count: u32,
        source: UserId,
        target: UserId,
        admin_id: UserId,
    },
}

/// Request body of `POST /api/game/{id}/user`.
#[derive(Debug, Clone, Serialize)]
pub struct JoinBody {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_id: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_game_snapshot_parses_server_keys() {
        let raw = json!({
            "Stack_Max": 13,
            "Stack": 9,
            "State": "playfinal",
            "Move": -1,
            "Message": "",
            "First": 4,
            "Admins": [4],
            "Lobby_After_Game": false,
            "Ruleset_Id": "classic",
            "User": [
                {"Id": 4, "Name": "Anna", "Chips": 2, "Is_Admin": true, "Pending_Join": false},
                {"Id": 7, "Name": "Ben", "Chips": 0, "Pending_Join": true}
            ],
            "Reveal_Votes": 1,
            "Ruleset": {
                "id": "classic",
                "name": "Klassisch",
                "stack_max": 13,
                "play_final": true,
                "rules": [
                    {"name": "Schock aus", "dice": 111, "chips": -1},
                    {"name": "Schock 6", "dice": 611, "chips": 6}
                ]
            }
        });

        let game: Game = serde_json::from_value(raw).unwrap();
        assert_eq!(game.stack_max, 13);
        assert_eq!(game.state, GameState::PlayFinal);
        assert!(game.is_admin(4));
        assert!(!game.is_admin(7));
        assert_eq!(game.joined_users().count(), 1);
        assert_eq!(
            game.ruleset.as_ref().and_then(|r| r.schockaus_name()),
            Some("Schock aus")
        );
    }

    #[test]
    fn test_unknown_state_is_tolerated() {
        let game: Game = serde_json::from_value(json!({"State": "paused"})).unwrap();
        assert_eq!(game.state, GameState::Unknown);
        assert!(game.users.is_empty());
    }

    #[test]
    fn test_server_message_parse() {
        assert_eq!(
            ServerMessage::parse(r#"{"Message": "Spiel nicht gefunden"}"#),
            Some("Spiel nicht gefunden".to_string())
        );
        assert_eq!(ServerMessage::parse("<html>502</html>"), None);
        assert_eq!(ServerMessage::parse("{}"), None);
    }

    #[test]
    fn test_transfer_bodies() {
        let from_stack = ChipTransfer {
            source: TransferSource::Stack,
            target: 3,
            count: 2,
        };
        assert_eq!(
            serde_json::to_value(from_stack.body(1)).unwrap(),
            json!({"count": 2, "stack": true, "target": 3, "admin_id": 1})
        );

        let schockaus = ChipTransfer {
            source: TransferSource::Schockaus,
            target: 3,
            count: 5,
        };
        assert_eq!(
            serde_json::to_value(schockaus.body(1)).unwrap(),
            json!({"schockaus": true, "target": 3, "admin_id": 1})
        );

        let from_player = ChipTransfer {
            source: TransferSource::Player(9),
            target: 3,
            count: 1,
        };
        assert_eq!(
            serde_json::to_value(from_player.body(1)).unwrap(),
            json!({"count": 1, "source": 9, "target": 3, "admin_id": 1})
        );
    }

    #[test]
    fn test_transfer_source_values() {
        assert_eq!(TransferSource::from_value("stack"), Some(TransferSource::Stack));
        assert_eq!(
            TransferSource::from_value("schockaus"),
            Some(TransferSource::Schockaus)
        );
        assert_eq!(TransferSource::from_value("12"), Some(TransferSource::Player(12)));
        assert_eq!(TransferSource::from_value("nobody"), None);
    }

    #[test]
    fn test_join_body_omits_missing_reconnect_id() {
        let body = JoinBody {
            name: "Anna".to_string(),
            reconnect_id: None,
        };
        assert_eq!(serde_json::to_value(body).unwrap(), json!({"name": "Anna"}));
    }
}
