// App state and main event loop.
// Maps keys to panel actions, drives modals and refreshes after each action.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;

use crate::api::{User, UserId};
use crate::error::{PanelError, Result};
use crate::panel::{AdminAction, AdminPanel, Feedback, SelectList, selected_user};
use crate::ui;

/// Focused widget of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Roster,
    TransferSource,
    StackCount,
    TransferTarget,
    DeleteTarget,
    AdminTarget,
}

impl Focus {
    const ALL: [Focus; 6] = [
        Focus::Roster,
        Focus::TransferSource,
        Focus::StackCount,
        Focus::TransferTarget,
        Focus::DeleteTarget,
        Focus::AdminTarget,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Focus::Roster => "Spieler",
            Focus::TransferSource => "Von",
            Focus::StackCount => "Anzahl",
            Focus::TransferTarget => "An",
            Focus::DeleteTarget => "Entfernen",
            Focus::AdminTarget => "Admin",
        }
    }

    /// Whether the widget belongs to the manual chip transfer form.
    pub fn in_transfer_form(&self) -> bool {
        matches!(
            self,
            Focus::TransferSource | Focus::StackCount | Focus::TransferTarget
        )
    }

    fn step(&self, forward: bool, transfer_visible: bool) -> Self {
        let visible: Vec<Focus> = Self::ALL
            .into_iter()
            .filter(|focus| transfer_visible || !focus.in_transfer_form())
            .collect();
        let current = visible.iter().position(|focus| focus == self).unwrap_or(0);
        let len = visible.len();
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        visible[next]
    }

    pub fn next(&self, transfer_visible: bool) -> Self {
        self.step(true, transfer_visible)
    }

    pub fn prev(&self, transfer_visible: bool) -> Self {
        self.step(false, transfer_visible)
    }
}

/// Overlay on top of the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    /// Confirmation prompt guarding `action`.
    Confirm {
        prompt: &'static str,
        action: AdminAction,
    },
    /// Blocking message. With `reload` set, closing it reloads the panel.
    Dialog { message: String, reload: bool },
    /// Name input for joining the game.
    Join { name: String },
    Rules,
    Help,
}

/// What a key press asks the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Quit,
    FocusNext,
    FocusPrev,
    SelectNext,
    SelectPrev,
    Transfer,
    DeleteSelected,
    ToggleAdminSelected,
    BackToWaiting,
    SortDice,
    Distribute,
    VoteReveal,
    MarkLeaveSelected,
    MarkLobby,
    OpenJoin,
    Input(char),
    Backspace,
    Submit,
    Confirm,
    Cancel,
    Refresh,
    ToggleManualCorrection,
    ShowRules,
    ShowHelp,
}

/// Main application state.
pub struct App {
    pub panel: AdminPanel,
    pub focus: Focus,
    /// Selected row of the roster.
    pub roster_index: usize,
    pub modal: Option<Modal>,
    /// Last local notice (missing selection, join result).
    pub notice: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(panel: AdminPanel) -> Self {
        Self {
            panel,
            focus: Focus::default(),
            roster_index: 0,
            modal: None,
            notice: None,
            should_quit: false,
        }
    }

    /// Users shown in the roster.
    pub fn roster(&self) -> &[User] {
        self.panel
            .game()
            .map(|game| game.users.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_roster_user(&self) -> Option<&User> {
        self.roster().get(self.roster_index)
    }

    /// Main event loop.
    pub async fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        let feedback = self.panel.refresh().await;
        self.show(feedback).await;

        while !self.should_quit {
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events().await?;
        }
        Ok(())
    }

    #[allow(clippy::collapsible_if)]
    async fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(intent) = self.handle_key(key) {
                        self.apply(intent).await;
                    }
                }
            }
        }
        Ok(())
    }

    /// Translate a key press into an intent for the current mode.
    pub fn handle_key(&self, key: KeyEvent) -> Option<Intent> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Intent::Quit);
        }

        match &self.modal {
            Some(Modal::Confirm { .. }) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('j') | KeyCode::Enter => Some(Intent::Confirm),
                KeyCode::Char('n') | KeyCode::Esc => Some(Intent::Cancel),
                _ => None,
            },
            Some(Modal::Dialog { .. }) => match key.code {
                KeyCode::Enter | KeyCode::Esc => Some(Intent::Cancel),
                _ => None,
            },
            Some(Modal::Join { .. }) => match key.code {
                KeyCode::Enter => Some(Intent::Submit),
                KeyCode::Esc => Some(Intent::Cancel),
                KeyCode::Backspace => Some(Intent::Backspace),
                KeyCode::Char(c) => Some(Intent::Input(c)),
                _ => None,
            },
            Some(Modal::Rules) | Some(Modal::Help) => match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?') | KeyCode::Char('i') => {
                    Some(Intent::Cancel)
                }
                _ => None,
            },
            None => match key.code {
                KeyCode::Char('q') => Some(Intent::Quit),
                KeyCode::Tab => Some(Intent::FocusNext),
                KeyCode::BackTab => Some(Intent::FocusPrev),
                KeyCode::Down | KeyCode::Right => Some(Intent::SelectNext),
                KeyCode::Up | KeyCode::Left => Some(Intent::SelectPrev),
                KeyCode::Enter if self.panel.manual_correction_visible() => {
                    Some(Intent::Transfer)
                }
                KeyCode::Char('d') => Some(Intent::DeleteSelected),
                KeyCode::Char('a') => Some(Intent::ToggleAdminSelected),
                KeyCode::Char('b') => Some(Intent::BackToWaiting),
                KeyCode::Char('s') => Some(Intent::SortDice),
                KeyCode::Char('x') if self.panel.distribute_enabled() => Some(Intent::Distribute),
                KeyCode::Char('v') => Some(Intent::VoteReveal),
                KeyCode::Char('l') => Some(Intent::MarkLeaveSelected),
                KeyCode::Char('L') => Some(Intent::MarkLobby),
                KeyCode::Char('j') if self.panel.join_enabled() => Some(Intent::OpenJoin),
                KeyCode::Char('r') => Some(Intent::Refresh),
                KeyCode::Char('m') => Some(Intent::ToggleManualCorrection),
                KeyCode::Char('i') => Some(Intent::ShowRules),
                KeyCode::Char('?') => Some(Intent::ShowHelp),
                KeyCode::Esc => Some(Intent::Cancel),
                _ => None,
            },
        }
    }

    /// Carry out an intent.
    pub async fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::Quit => self.should_quit = true,
            Intent::FocusNext => {
                self.focus = self.focus.next(self.panel.manual_correction_visible());
            }
            Intent::FocusPrev => {
                self.focus = self.focus.prev(self.panel.manual_correction_visible());
            }
            Intent::SelectNext => self.move_selection(true),
            Intent::SelectPrev => self.move_selection(false),
            Intent::Transfer => self.request(Ok(AdminAction::TransferChips)).await,
            Intent::DeleteSelected => {
                let action = selected_user(&self.panel.selects.delete_target, "delete target")
                    .map(AdminAction::DeletePlayer);
                self.request(action).await;
            }
            Intent::ToggleAdminSelected => {
                let action = selected_user(&self.panel.selects.admin_target, "admin target")
                    .map(AdminAction::ToggleAdmin);
                self.request(action).await;
            }
            Intent::BackToWaiting => self.request(Ok(AdminAction::BackToWaiting)).await,
            Intent::SortDice => self.request(Ok(AdminAction::SortDice)).await,
            Intent::Distribute => self.request(Ok(AdminAction::Distribute)).await,
            Intent::VoteReveal => self.request(Ok(AdminAction::VoteReveal)).await,
            Intent::MarkLeaveSelected => {
                let action = self.roster_user_id().map(AdminAction::MarkLeave);
                self.request(action).await;
            }
            Intent::MarkLobby => self.request(Ok(AdminAction::MarkLobby)).await,
            Intent::OpenJoin => {
                let name = self.panel.context().identity.name.clone().unwrap_or_default();
                self.modal = Some(Modal::Join { name });
            }
            Intent::Input(c) => {
                if let Some(Modal::Join { name }) = &mut self.modal {
                    name.push(c);
                }
            }
            Intent::Backspace => {
                if let Some(Modal::Join { name }) = &mut self.modal {
                    name.pop();
                }
            }
            Intent::Submit => {
                if let Some(Modal::Join { name }) = self.modal.take() {
                    self.run_action(AdminAction::Join(name), true).await;
                }
            }
            Intent::Confirm => {
                if let Some(Modal::Confirm { action, .. }) = self.modal.take() {
                    self.run_action(action, true).await;
                }
            }
            Intent::Cancel => match self.modal.take() {
                Some(Modal::Dialog { reload: true, .. }) => {
                    let feedback = self.panel.reload().await;
                    self.show(feedback).await;
                }
                Some(_) => {}
                None => {
                    self.panel.clear_alert();
                    self.notice = None;
                }
            },
            Intent::Refresh => {
                let feedback = self.panel.refresh().await;
                self.show(feedback).await;
            }
            Intent::ToggleManualCorrection => {
                let visible = self.panel.toggle_manual_correction();
                if !visible && self.focus.in_transfer_form() {
                    self.focus = Focus::Roster;
                }
            }
            Intent::ShowRules => self.modal = Some(Modal::Rules),
            Intent::ShowHelp => self.modal = Some(Modal::Help),
        }
    }

    fn roster_user_id(&self) -> Result<UserId> {
        self.selected_roster_user()
            .map(|user| user.id)
            .ok_or(PanelError::NoSelection("player"))
    }

    fn focused_list(&mut self) -> Option<&mut SelectList> {
        let selects = &mut self.panel.selects;
        match self.focus {
            Focus::Roster => None,
            Focus::TransferSource => Some(&mut selects.transfer_source),
            Focus::StackCount => Some(&mut selects.stack_count),
            Focus::TransferTarget => Some(&mut selects.transfer_target),
            Focus::DeleteTarget => Some(&mut selects.delete_target),
            Focus::AdminTarget => Some(&mut selects.admin_target),
        }
    }

    fn move_selection(&mut self, forward: bool) {
        if let Some(list) = self.focused_list() {
            if forward {
                list.select_next();
            } else {
                list.select_prev();
            }
            return;
        }

        let len = self.roster().len();
        if len == 0 {
            self.roster_index = 0;
        } else if forward {
            self.roster_index = (self.roster_index + 1).min(len - 1);
        } else {
            self.roster_index = self.roster_index.saturating_sub(1);
        }
    }

    /// Ask for confirmation if the action needs it, otherwise send it.
    async fn request(&mut self, action: Result<AdminAction>) {
        match action {
            Ok(action) => match action.confirmation() {
                Some(prompt) => self.modal = Some(Modal::Confirm { prompt, action }),
                None => self.run_action(action, false).await,
            },
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    async fn run_action(&mut self, action: AdminAction, confirmed: bool) {
        let is_join = matches!(action, AdminAction::Join(_));
        let feedback = self.panel.dispatch(action, confirmed).await;
        let refresh = !is_join && feedback != Feedback::Cancelled;
        self.show(feedback).await;

        // Stands in for the server's push channel.
        if refresh {
            let feedback = self.panel.refresh().await;
            self.show(feedback).await;
        }
    }

    async fn show(&mut self, feedback: Feedback) {
        match feedback {
            Feedback::None | Feedback::Cancelled | Feedback::Alert(_) => {}
            Feedback::Dialog(message) => {
                self.modal = Some(Modal::Dialog {
                    message,
                    reload: false,
                });
            }
            Feedback::Reload(message) => {
                self.modal = Some(Modal::Dialog {
                    message,
                    reload: true,
                });
            }
            Feedback::Joined(name) => {
                self.notice = Some(format!("Beigetreten als {}", name));
            }
        }

        let len = self.roster().len();
        if self.roster_index >= len {
            self.roster_index = len.saturating_sub(1);
        }
    }
}

/// RAII guard that restores the terminal on drop, also on panic.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        crossterm::execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Run the terminal admin panel until the user quits.
pub async fn run(panel: AdminPanel) -> io::Result<()> {
    let _terminal_guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(panel);
    app.run(&mut terminal).await
}
