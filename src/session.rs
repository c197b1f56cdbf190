// Session context for panel actions.
// Holds the game id and the acting user's identity, and persists the identity locally.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::api::{Game, UserId};
use crate::error::{PanelError, Result};
use crate::storage;

/// Identifier of a running game session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameId(String);

impl GameId {
    /// Build a game id from text as it appears in page markup or config.
    /// Quote characters are stripped and surrounding whitespace trimmed.
    pub fn new(raw: &str) -> Result<Self> {
        let stripped: String = raw.chars().filter(|c| *c != '"' && *c != '\'').collect();
        let trimmed = stripped.trim();
        if trimmed.is_empty() {
            return Err(PanelError::MissingGameId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The local player's identity, remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Option<UserId>,
    pub name: Option<String>,
}

impl Identity {
    /// Label shown for the local player.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("Spieler: {}", name),
            None => "Spieler: -".to_string(),
        }
    }
}

/// JSON file backing the local identity.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the stored identity; a missing file yields an empty identity.
    pub fn load(&self) -> Result<Identity> {
        Ok(storage::read_json(&self.path)?.unwrap_or_default())
    }

    pub fn save(&self, identity: &Identity) -> Result<()> {
        storage::write_json(&self.path, identity)
    }
}

/// Everything an action needs to know about who acts in which game.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub game: GameId,
    pub identity: Identity,
}

impl SessionContext {
    pub fn new(game: GameId, identity: Identity) -> Self {
        Self { game, identity }
    }

    /// Id of the acting user; actions attributed to a user fail without one.
    pub fn acting_user(&self) -> Result<UserId> {
        self.identity.id.ok_or(PanelError::NoIdentity)
    }

    /// Whether the acting user is one of the game's admins.
    pub fn is_admin(&self, game: &Game) -> bool {
        self.identity.id.is_some_and(|id| game.is_admin(id))
    }
}
