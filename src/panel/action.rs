// Admin actions and how their outcomes reach the user.
// Each action knows its confirmation prompt and where failures are surfaced.

use crate::api::UserId;

/// Generic message when a rejection carries no readable `Message`.
pub const FALLBACK_MESSAGE: &str = "Fehler";
/// Generic message for rejected chip transfers.
pub const TRANSFER_FALLBACK_MESSAGE: &str = "Allgemeiner Fehler";
/// Shown when a join is attempted without a name.
pub const EMPTY_NAME_MESSAGE: &str = "Bitte einen Namen eingeben";

/// A user-initiated panel action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    DeletePlayer(UserId),
    SortDice,
    ToggleAdmin(UserId),
    BackToWaiting,
    TransferChips,
    Distribute,
    VoteReveal,
    MarkLeave(UserId),
    MarkLobby,
    Join(String),
}

/// Where an action's failure is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// The panel's alert line.
    AlertLine,
    /// A blocking dialog that must be dismissed.
    Dialog,
    /// Nowhere; failures are only logged.
    Silent,
    /// A dialog followed by a full reload of the panel state.
    Reload,
}

/// What the caller should show after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Nothing to show; the next refresh brings the new state.
    None,
    /// The action needed confirmation and did not get it. Nothing was sent.
    Cancelled,
    Alert(String),
    Dialog(String),
    /// Show the message, then discard local state and reload.
    Reload(String),
    /// Join succeeded under the given name.
    Joined(String),
}

impl Surface {
    /// Feedback for a failure with `message` on this surface.
    pub fn failure(self, message: impl Into<String>) -> Feedback {
        let message = message.into();
        match self {
            Surface::AlertLine => Feedback::Alert(message),
            Surface::Dialog => Feedback::Dialog(message),
            Surface::Silent => Feedback::None,
            Surface::Reload => {
                Feedback::Reload(format!("Fehler: {}\nSeite wird neu geladen.", message))
            }
        }
    }
}

impl AdminAction {
    /// Prompt the user has to accept before the action is sent.
    pub fn confirmation(&self) -> Option<&'static str> {
        match self {
            AdminAction::DeletePlayer(_) => {
                Some("Bist du sicher das du den Spieler entfernen moechtest?")
            }
            AdminAction::ToggleAdmin(_) => Some("Moechtest du diesen Spieler zum Admin ernennen?"),
            AdminAction::BackToWaiting => Some(
                "Bist du sicher, dass du zurück zum Warteraum willst? Die Runde startet von vorne!",
            ),
            _ => None,
        }
    }

    pub fn surface(&self) -> Surface {
        match self {
            AdminAction::DeletePlayer(_)
            | AdminAction::SortDice
            | AdminAction::ToggleAdmin(_)
            | AdminAction::BackToWaiting
            | AdminAction::TransferChips => Surface::AlertLine,
            AdminAction::Distribute => Surface::Silent,
            AdminAction::VoteReveal | AdminAction::MarkLeave(_) | AdminAction::MarkLobby => {
                Surface::Dialog
            }
            AdminAction::Join(_) => Surface::Reload,
        }
    }

    pub fn fallback_message(&self) -> &'static str {
        match self {
            AdminAction::TransferChips => TRANSFER_FALLBACK_MESSAGE,
            _ => FALLBACK_MESSAGE,
        }
    }

    /// Short name for logs and the status bar.
    pub fn title(&self) -> &'static str {
        match self {
            AdminAction::DeletePlayer(_) => "Spieler entfernen",
            AdminAction::SortDice => "Würfel sortieren",
            AdminAction::ToggleAdmin(_) => "Admin ernennen",
            AdminAction::BackToWaiting => "Zurück zum Warteraum",
            AdminAction::TransferChips => "Chips verteilen",
            AdminAction::Distribute => "Auswertung verteilen",
            AdminAction::VoteReveal => "Aufdecken",
            AdminAction::MarkLeave(_) => "Nach dem Spiel gehen",
            AdminAction::MarkLobby => "Nach dem Spiel zur Lobby",
            AdminAction::Join(_) => "Beitreten",
        }
    }
}
