// Select list models for the admin panel.
// Rebuilds the player, transfer and chip count choices from a game snapshot.

use crate::api::{Game, TransferSource, UserId};

/// Label of the schockaus transfer option when the ruleset names none.
pub const DEFAULT_SCHOCKAUS_LABEL: &str = "Schock aus";

/// One choice in a select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A dropdown: ordered options plus the selected index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectList {
    options: Vec<SelectOption>,
    selected: usize,
}

impl SelectList {
    pub fn new(options: Vec<SelectOption>) -> Self {
        Self {
            options,
            selected: 0,
        }
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        if self.options.is_empty() {
            None
        } else {
            Some(self.selected)
        }
    }

    pub fn selected(&self) -> Option<&SelectOption> {
        self.options.get(self.selected)
    }

    pub fn selected_value(&self) -> Option<&str> {
        self.selected().map(|option| option.value.as_str())
    }

    /// Select the option with `value`. Returns false if there is none.
    pub fn select_value(&mut self, value: &str) -> bool {
        match self.options.iter().position(|o| o.value == value) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        if !self.options.is_empty() && self.selected + 1 < self.options.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn push(&mut self, option: SelectOption) {
        self.options.push(option);
    }

    /// Drop every option from index `keep` on.
    pub fn truncate(&mut self, keep: usize) {
        self.options.truncate(keep);
        if self.selected >= self.options.len() {
            self.selected = 0;
        }
    }

    fn contains_value(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    /// Replace all options, keeping the selection on the same value if it survives.
    fn replace(&mut self, options: Vec<SelectOption>) {
        let previous = self.selected_value().map(str::to_string);
        self.options = options;
        self.selected = 0;
        if let Some(previous) = previous {
            self.select_value(&previous);
        }
    }
}

/// Every select list the admin panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSelects {
    /// Stack, schockaus pool, then the players chips can be taken from.
    pub transfer_source: SelectList,
    pub transfer_target: SelectList,
    pub delete_target: SelectList,
    pub admin_target: SelectList,
    /// Leading `0` option followed by `1..=Stack_Max`.
    pub stack_count: SelectList,
}

impl Default for PlayerSelects {
    fn default() -> Self {
        Self {
            transfer_source: SelectList::new(Self::fixed_sources(DEFAULT_SCHOCKAUS_LABEL)),
            transfer_target: SelectList::default(),
            delete_target: SelectList::default(),
            admin_target: SelectList::default(),
            stack_count: SelectList::new(vec![SelectOption::new("0", "0")]),
        }
    }
}

impl PlayerSelects {
    /// Number of fixed (non-player) entries at the top of the transfer source list.
    pub const FIXED_SOURCES: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }

    fn fixed_sources(schockaus_label: &str) -> Vec<SelectOption> {
        vec![
            SelectOption::new(TransferSource::STACK_VALUE, "Stapel"),
            SelectOption::new(TransferSource::SCHOCKAUS_VALUE, schockaus_label),
        ]
    }

    /// Rebuild every list from `game` as seen by the acting user `me`.
    ///
    /// Players still waiting to join are never listed. The acting user is left
    /// out of the delete and admin lists but may be a transfer party.
    pub fn rebuild(&mut self, game: &Game, me: Option<UserId>) {
        let joined: Vec<SelectOption> = game
            .joined_users()
            .map(|u| SelectOption::new(u.id.to_string(), u.name.clone()))
            .collect();
        let others: Vec<SelectOption> = game
            .joined_users()
            .filter(|u| Some(u.id) != me)
            .map(|u| SelectOption::new(u.id.to_string(), u.name.clone()))
            .collect();

        let schockaus_label = game
            .ruleset
            .as_ref()
            .and_then(|ruleset| ruleset.schockaus_name())
            .unwrap_or(DEFAULT_SCHOCKAUS_LABEL);
        let mut sources = Self::fixed_sources(schockaus_label);
        sources.extend(joined.iter().cloned());

        self.transfer_source.replace(sources);
        self.transfer_target.replace(joined);
        self.delete_target.replace(others.clone());
        self.admin_target.replace(others);
        self.rebuild_stack_counts(game.stack_max);
    }

    /// Keep the leading option and make sure `1..=max` each appear exactly once.
    fn rebuild_stack_counts(&mut self, max: u32) {
        let selected = self.stack_count.selected_value().map(str::to_string);
        if self.stack_count.is_empty() {
            self.stack_count.push(SelectOption::new("0", "0"));
        }
        self.stack_count.truncate(1);

        for count in 1..=max {
            let value = count.to_string();
            if !self.stack_count.contains_value(&value) {
                self.stack_count.push(SelectOption::new(value.clone(), value));
            }
        }

        if let Some(selected) = selected {
            self.stack_count.select_value(&selected);
        }
    }

    /// Put the transfer form back to its initial choices.
    pub fn reset_transfer(&mut self) {
        self.stack_count.select_value("0");
        self.transfer_source.select_value(TransferSource::STACK_VALUE);
    }
}
