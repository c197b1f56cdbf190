// Admin panel controller.
// Turns admin actions into game server calls and tracks what the panel shows.

pub mod action;
pub mod selects;

pub use action::{AdminAction, Feedback, Surface};
pub use selects::{PlayerSelects, SelectList, SelectOption};

use crate::api::{ApiOutcome, ChipTransfer, Game, GameClient, JoinBody, Rule, TransferSource, UserId};
use crate::error::{PanelError, Result};
use crate::session::{GameId, IdentityStore, SessionContext};

use self::action::{EMPTY_NAME_MESSAGE, FALLBACK_MESSAGE};

/// Feedback for a settled request: nothing on success, the surface's failure otherwise.
fn settle<T>(outcome: &ApiOutcome<T>, surface: Surface, fallback: &str) -> Feedback {
    match outcome.rejection_message(fallback) {
        Some(message) => surface.failure(message),
        None => Feedback::None,
    }
}

/// Parse the selected user id of `list`.
pub fn selected_user(list: &SelectList, what: &'static str) -> Result<UserId> {
    list.selected_value()
        .and_then(|value| value.parse().ok())
        .ok_or(PanelError::NoSelection(what))
}

/// State and actions of the admin panel for one game.
pub struct AdminPanel {
    client: GameClient,
    context: SessionContext,
    identity_store: IdentityStore,
    /// Dropdowns of the panel.
    pub selects: PlayerSelects,
    game: Option<Game>,
    alert: Option<String>,
    distribute_enabled: bool,
    join_enabled: bool,
    manual_correction: bool,
}

impl AdminPanel {
    /// Create a panel for `game`, loading the stored identity.
    pub fn new(client: GameClient, game: GameId, identity_store: IdentityStore) -> Result<Self> {
        let identity = identity_store.load()?;
        Ok(Self {
            client,
            context: SessionContext::new(game, identity),
            identity_store,
            selects: PlayerSelects::new(),
            game: None,
            alert: None,
            distribute_enabled: true,
            join_enabled: true,
            manual_correction: false,
        })
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// Current content of the alert line.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn clear_alert(&mut self) {
        self.alert = None;
    }

    pub fn is_admin(&self) -> bool {
        self.game
            .as_ref()
            .is_some_and(|game| self.context.is_admin(game))
    }

    pub fn distribute_enabled(&self) -> bool {
        self.distribute_enabled
    }

    pub fn join_enabled(&self) -> bool {
        self.join_enabled
    }

    pub fn manual_correction_visible(&self) -> bool {
        self.manual_correction
    }

    /// Show or hide the manual chip transfer form.
    pub fn toggle_manual_correction(&mut self) -> bool {
        self.manual_correction = !self.manual_correction;
        self.manual_correction
    }

    /// Rules of the game's ruleset, empty if the game has none.
    pub fn rules(&self) -> &[Rule] {
        self.game
            .as_ref()
            .and_then(|game| game.ruleset.as_ref())
            .map(|ruleset| ruleset.rules.as_slice())
            .unwrap_or(&[])
    }

    /// Take over a fresh game snapshot, as pushed by the server.
    pub fn apply_game(&mut self, game: Game) {
        self.selects.rebuild(&game, self.context.identity.id);
        self.distribute_enabled = true;
        self.game = Some(game);
    }

    /// Fetch the current game snapshot and rebuild the selects.
    pub async fn refresh(&mut self) -> Feedback {
        let feedback = match self.client.get_game(&self.context.game).await {
            Ok(ApiOutcome::Success(game)) => {
                self.apply_game(game);
                Feedback::None
            }
            Ok(rejected) => settle(&rejected, Surface::AlertLine, FALLBACK_MESSAGE),
            Err(e) => {
                log::warn!("Refreshing game {} failed: {}", self.context.game, e);
                Surface::AlertLine.failure(e.to_string())
            }
        };
        self.record(&feedback);
        feedback
    }

    /// Discard local state and start over from the stored identity and server state.
    pub async fn reload(&mut self) -> Feedback {
        match self.identity_store.load() {
            Ok(identity) => self.context.identity = identity,
            Err(e) => log::warn!("Reloading identity failed: {}", e),
        }
        self.selects = PlayerSelects::new();
        self.game = None;
        self.alert = None;
        self.distribute_enabled = true;
        self.join_enabled = true;
        self.refresh().await
    }

    /// Run `action`. Actions with a confirmation prompt are only sent when
    /// `confirmed` is true.
    pub async fn dispatch(&mut self, action: AdminAction, confirmed: bool) -> Feedback {
        if action.confirmation().is_some() && !confirmed {
            return Feedback::Cancelled;
        }

        let surface = action.surface();
        let title = action.title();
        let result = match action {
            AdminAction::DeletePlayer(user_id) => self.delete_player(user_id).await,
            AdminAction::SortDice => self.sort_dice().await,
            AdminAction::ToggleAdmin(target) => self.toggle_admin(target).await,
            AdminAction::BackToWaiting => self.back_to_waiting().await,
            AdminAction::TransferChips => self.transfer_chips().await,
            AdminAction::Distribute => self.distribute().await,
            AdminAction::VoteReveal => self.vote_reveal().await,
            AdminAction::MarkLeave(user_id) => self.mark_leave(user_id).await,
            AdminAction::MarkLobby => self.mark_lobby().await,
            AdminAction::Join(name) => self.join(&name).await,
        };

        let feedback = match result {
            Ok(feedback) => feedback,
            Err(e) => {
                log::warn!("{} failed: {}", title, e);
                if surface == Surface::Reload {
                    self.join_enabled = true;
                }
                surface.failure(e.to_string())
            }
        };
        self.record(&feedback);
        feedback
    }

    fn record(&mut self, feedback: &Feedback) {
        if let Feedback::Alert(message) = feedback {
            self.alert = Some(message.clone());
        }
    }

    /// Chip transfer described by the current transfer selects.
    pub fn chip_transfer(&self) -> Result<ChipTransfer> {
        let source = self
            .selects
            .transfer_source
            .selected_value()
            .and_then(TransferSource::from_value)
            .ok_or(PanelError::NoSelection("transfer source"))?;
        let target = selected_user(&self.selects.transfer_target, "transfer target")?;
        let count = self
            .selects
            .stack_count
            .selected_value()
            .and_then(|value| value.parse().ok())
            .unwrap_or(0);

        Ok(ChipTransfer {
            source,
            target,
            count,
        })
    }

    async fn delete_player(&mut self, user_id: UserId) -> Result<Feedback> {
        let outcome = self
            .client
            .delete_player(&self.context.game, user_id)
            .await?;
        Ok(settle(&outcome, Surface::AlertLine, FALLBACK_MESSAGE))
    }

    async fn sort_dice(&mut self) -> Result<Feedback> {
        let admin_id = self.context.acting_user()?;
        let outcome = self.client.sort_dice(&self.context.game, admin_id).await?;
        Ok(settle(&outcome, Surface::AlertLine, FALLBACK_MESSAGE))
    }

    async fn toggle_admin(&mut self, target: UserId) -> Result<Feedback> {
        let requester = self.context.acting_user()?;
        let outcome = self
            .client
            .toggle_admin(&self.context.game, target, requester)
            .await?;
        Ok(settle(&outcome, Surface::AlertLine, FALLBACK_MESSAGE))
    }

    async fn back_to_waiting(&mut self) -> Result<Feedback> {
        let outcome = self.client.back_to_waiting(&self.context.game).await?;
        Ok(settle(&outcome, Surface::AlertLine, FALLBACK_MESSAGE))
    }

    async fn transfer_chips(&mut self) -> Result<Feedback> {
        let admin_id = self.context.acting_user()?;
        let transfer = self.chip_transfer()?;
        let outcome = self
            .client
            .transfer_chips(&self.context.game, &transfer, admin_id)
            .await?;

        match outcome {
            ApiOutcome::Success(message) => {
                self.selects.reset_transfer();
                Ok(Feedback::Alert(message.unwrap_or_default()))
            }
            rejected => Ok(settle(
                &rejected,
                Surface::AlertLine,
                AdminAction::TransferChips.fallback_message(),
            )),
        }
    }

    async fn distribute(&mut self) -> Result<Feedback> {
        self.distribute_enabled = false;

        // A rejection usually means another admin distributed first.
        match self.client.distribute(&self.context.game).await {
            Ok(ApiOutcome::Success(message)) => {
                log::info!("Chips distributed: {}", message.unwrap_or_default());
            }
            Ok(ApiOutcome::Rejected { status, message }) => {
                log::warn!(
                    "Distribute rejected with {}: {}",
                    status,
                    message.as_deref().unwrap_or("<no message>")
                );
            }
            Err(e) => log::warn!("Distribute failed: {}", e),
        }
        Ok(Feedback::None)
    }

    async fn vote_reveal(&mut self) -> Result<Feedback> {
        let requester = self.context.acting_user()?;
        let outcome = self
            .client
            .vote_reveal(&self.context.game, requester)
            .await?;
        Ok(settle(&outcome, Surface::Dialog, FALLBACK_MESSAGE))
    }

    async fn mark_leave(&mut self, user_id: UserId) -> Result<Feedback> {
        let requester = self.context.acting_user()?;
        let outcome = self
            .client
            .mark_leave(&self.context.game, user_id, requester)
            .await?;
        Ok(settle(&outcome, Surface::Dialog, FALLBACK_MESSAGE))
    }

    async fn mark_lobby(&mut self) -> Result<Feedback> {
        let requester = self.context.acting_user()?;
        let outcome = self.client.mark_lobby(&self.context.game, requester).await?;
        Ok(settle(&outcome, Surface::Dialog, FALLBACK_MESSAGE))
    }

    async fn join(&mut self, name: &str) -> Result<Feedback> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Feedback::Dialog(EMPTY_NAME_MESSAGE.to_string()));
        }

        self.join_enabled = false;
        let body = JoinBody {
            name: name.to_string(),
            reconnect_id: self.context.identity.id,
        };
        let outcome = self.client.join(&self.context.game, &body).await?;

        match outcome {
            ApiOutcome::Success(game) => {
                let mut identity = self.context.identity.clone();
                identity.name = Some(name.to_string());
                if let Some(user) = game.users.iter().rev().find(|u| u.name == name) {
                    identity.id = Some(user.id);
                }
                if let Err(e) = self.identity_store.save(&identity) {
                    log::warn!("Saving identity failed: {}", e);
                }
                log::info!("Joined game {} as {:?}", self.context.game, identity);

                self.context.identity = identity;
                self.join_enabled = true;
                self.apply_game(game);
                Ok(Feedback::Joined(name.to_string()))
            }
            rejected => Ok(settle(&rejected, Surface::Reload, FALLBACK_MESSAGE)),
        }
    }
}
