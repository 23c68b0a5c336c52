//! # Navigation Controller
//!
//! Screen navigation and history management for one portal.
//!
//! `navigate`, `back`, `replace` and `reset` (or [`NavAction`] through
//! [`NavigationController::dispatch`]) are the only ways to mutate
//! [`NavigationState`]. None of them can fail.
//!
//! ## Back resolution
//!
//! 1. A non-empty history always wins: pop its tail.
//! 2. With no history, a shared screen whose fallback is only the portal's
//!    generic default returns to the screen it was entered from, if known.
//! 3. Otherwise use the fallback route map.
//! 4. Otherwise do nothing.

use crate::routes;
use crate::screen::Screen;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Payload attached to the current screen by `navigate`.
pub type NavPayload = serde_json::Value;

/// Navigation limits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Optional cap on history length; the oldest entry is dropped beyond it.
    /// Unbounded when unset.
    pub max_history: Option<usize>,
}

/// Navigation action for the controller
#[derive(Clone, Debug, PartialEq)]
pub enum NavAction {
    /// Go to a specific screen
    GoTo {
        /// Target screen
        screen: Screen,
        /// Optional data for the target
        payload: Option<NavPayload>,
    },
    /// Go back
    Back,
    /// Replace current screen without adding to history
    Replace(Screen),
    /// Clear history and go to screen
    Reset(Screen),
}

/// How a `back()` call was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackOutcome {
    /// Popped the history stack
    Popped(Screen),
    /// Returned to the flow a shared screen was entered from
    ContextReturn(Screen),
    /// Used the static fallback route
    Fallback(Screen),
    /// Nothing to go back to
    Noop,
}

impl BackOutcome {
    /// Screen that became current, if any.
    pub fn screen(self) -> Option<Screen> {
        match self {
            Self::Popped(s) | Self::ContextReturn(s) | Self::Fallback(s) => Some(s),
            Self::Noop => None,
        }
    }
}

/// Navigation state owned by a controller.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NavigationState {
    current: Screen,
    history: VecDeque<Screen>,
    context: HashMap<Screen, Screen>,
    payload: Option<NavPayload>,
}

impl NavigationState {
    fn new(initial: Screen) -> Self {
        Self {
            current: initial,
            history: VecDeque::new(),
            context: HashMap::new(),
            payload: None,
        }
    }

    /// Current screen
    pub fn current(&self) -> Screen {
        self.current
    }

    /// History, oldest first
    pub fn history(&self) -> &VecDeque<Screen> {
        &self.history
    }

    /// Remembered origin for a shared screen
    pub fn context_for(&self, screen: Screen) -> Option<Screen> {
        self.context.get(&screen).copied()
    }

    /// Number of remembered origins
    pub fn context_len(&self) -> usize {
        self.context.len()
    }

    /// Payload for the current screen
    pub fn payload(&self) -> Option<&NavPayload> {
        self.payload.as_ref()
    }
}

/// Screen navigation controller
#[derive(Clone, Debug)]
pub struct NavigationController {
    state: NavigationState,
    max_history: Option<usize>,
}

impl NavigationController {
    /// Create a controller starting at the given screen
    pub fn new(initial: Screen) -> Self {
        Self::with_config(initial, &NavigationConfig::default())
    }

    /// Create a controller with explicit limits
    pub fn with_config(initial: Screen, config: &NavigationConfig) -> Self {
        Self {
            state: NavigationState::new(initial),
            max_history: config.max_history.map(|max| max.max(1)),
        }
    }

    /// Get the current screen
    pub fn current(&self) -> Screen {
        self.state.current
    }

    /// Payload for the current screen
    pub fn payload(&self) -> Option<&NavPayload> {
        self.state.payload()
    }

    /// Read-only view of the full state
    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// History, oldest first
    pub fn history(&self) -> &VecDeque<Screen> {
        &self.state.history
    }

    /// Remembered origin for a shared screen
    pub fn context_for(&self, screen: Screen) -> Option<Screen> {
        self.state.context_for(screen)
    }

    /// Check if history can be popped
    pub fn can_back(&self) -> bool {
        !self.state.history.is_empty()
    }

    /// Get history length
    pub fn history_len(&self) -> usize {
        self.state.history.len()
    }

    /// Apply an action
    pub fn dispatch(&mut self, action: NavAction) -> Option<BackOutcome> {
        match action {
            NavAction::GoTo { screen, payload } => {
                self.navigate(screen, payload);
                None
            }
            NavAction::Back => Some(self.back()),
            NavAction::Replace(screen) => {
                self.replace(screen);
                None
            }
            NavAction::Reset(screen) => {
                self.reset(screen);
                None
            }
        }
    }

    /// Go to a screen, pushing the current one onto history
    pub fn navigate(&mut self, target: Screen, payload: Option<NavPayload>) {
        let previous = self.state.current;
        self.state.history.push_back(previous);
        if self
            .max_history
            .is_some_and(|max| self.state.history.len() > max)
        {
            self.state.history.pop_front();
        }
        self.remember_origin(target, previous);
        self.state.current = target;
        self.state.payload = payload;
        tracing::debug!(from = %previous, to = %target, depth = self.state.history.len(), "navigate");
    }

    /// Go back one step
    pub fn back(&mut self) -> BackOutcome {
        let outcome = self.resolve_back();
        if let Some(screen) = outcome.screen() {
            if let BackOutcome::Popped(_) = outcome {
                self.state.history.pop_back();
            }
            tracing::debug!(from = %self.state.current, to = %screen, ?outcome, "back");
            self.state.current = screen;
            self.state.payload = None;
        } else {
            tracing::debug!(screen = %self.state.current, "back: nothing to return to");
        }
        outcome
    }

    /// Replace current screen without touching history
    pub fn replace(&mut self, screen: Screen) {
        let previous = self.state.current;
        self.remember_origin(screen, previous);
        self.state.current = screen;
        self.state.payload = None;
        tracing::debug!(from = %previous, to = %screen, "replace");
    }

    /// Reset to a screen, clearing history and context memory
    pub fn reset(&mut self, initial: Screen) {
        self.state = NavigationState::new(initial);
        tracing::debug!(screen = %initial, "reset");
    }

    fn resolve_back(&self) -> BackOutcome {
        if let Some(prev) = self.state.history.back() {
            return BackOutcome::Popped(*prev);
        }

        let current = self.state.current;
        if routes::falls_back_to_generic(current) {
            if let Some(origin) = self.state.context_for(current) {
                return BackOutcome::ContextReturn(origin);
            }
        }

        match routes::fallback_for(current) {
            Some(parent) => BackOutcome::Fallback(parent),
            None => BackOutcome::Noop,
        }
    }

    fn remember_origin(&mut self, target: Screen, previous: Screen) {
        if target.remembers_origin(previous) {
            self.state.context.insert(target, previous);
        }
    }
}
