//! Theme preference and resolution.
//!
//! The user picks one of light, dark or system. The resolver turns that into a
//! concrete light or dark mode, consulting the appearance signal for `system`,
//! applies it to the visual root and keeps it current while the signal moves.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use clap::ValueEnum;
use log::{debug, error, warn};

use crate::appearance::{AppearanceSignal, SubscriptionId};
use crate::storage::{Storage, THEME_KEY};

/// Stored three-way choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    /// Accepts exactly `light`, `dark` or `system`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "light" => Some(ThemePreference::Light),
            "dark" => Some(ThemePreference::Dark),
            "system" => Some(ThemePreference::System),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemePreference::Light => "Light mode",
            ThemePreference::Dark => "Dark mode",
            ThemePreference::System => "System theme",
        }
    }

    /// Next value in the cycle light -> dark -> system -> light.
    pub fn next(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::System,
            ThemePreference::System => ThemePreference::Light,
        }
    }

    /// Concrete mode for this preference given the current signal.
    pub fn resolve(self, system_prefers_dark: bool) -> ResolvedTheme {
        match self {
            ThemePreference::Light => ResolvedTheme::Light,
            ThemePreference::Dark => ResolvedTheme::Dark,
            ThemePreference::System => ResolvedTheme::from_dark(system_prefers_dark),
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The mode actually rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl ResolvedTheme {
    pub fn from_dark(dark: bool) -> Self {
        if dark { ResolvedTheme::Dark } else { ResolvedTheme::Light }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "light" => Some(ResolvedTheme::Light),
            "dark" => Some(ResolvedTheme::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResolvedTheme::Light => "light",
            ResolvedTheme::Dark => "dark",
        }
    }
}

impl fmt::Display for ResolvedTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the resolved theme lands for rendering.
pub trait ThemeRoot {
    fn apply(&self, theme: ResolvedTheme);
}

/// Root-level dark marker read by the renderer.
#[derive(Debug, Default)]
pub struct RootMarker {
    dark: Cell<bool>,
}

impl RootMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dark(&self) -> bool {
        self.dark.get()
    }

    pub fn theme(&self) -> ResolvedTheme {
        ResolvedTheme::from_dark(self.is_dark())
    }
}

impl ThemeRoot for RootMarker {
    fn apply(&self, theme: ResolvedTheme) {
        self.dark.set(theme == ResolvedTheme::Dark);
    }
}

#[derive(Debug, Clone, Copy)]
struct ThemeState {
    preference: ThemePreference,
    resolved: ResolvedTheme,
}

/// Owns the preference, resolves it, and follows the appearance signal.
///
/// The signal subscription is made once in `new` and removed on drop.
pub struct ThemeResolver {
    state: Rc<RefCell<ThemeState>>,
    storage: Rc<dyn Storage>,
    signal: Rc<dyn AppearanceSignal>,
    root: Rc<dyn ThemeRoot>,
    subscription: SubscriptionId,
}

impl ThemeResolver {
    pub fn new(
        storage: Rc<dyn Storage>,
        signal: Rc<dyn AppearanceSignal>,
        root: Rc<dyn ThemeRoot>,
    ) -> Self {
        let state = match storage.get(THEME_KEY) {
            Ok(stored) => {
                let preference = stored
                    .as_deref()
                    .and_then(ThemePreference::parse)
                    .unwrap_or_default();
                ThemeState {
                    preference,
                    resolved: preference.resolve(signal.prefers_dark()),
                }
            }
            Err(e) => {
                // Storage we cannot reach at all falls back to dark, not system.
                warn!("Error reading theme preference, falling back to dark: {e}");
                ThemeState {
                    preference: ThemePreference::Dark,
                    resolved: ResolvedTheme::Dark,
                }
            }
        };
        root.apply(state.resolved);
        debug!("theme loaded: preference={} resolved={}", state.preference, state.resolved);

        let state = Rc::new(RefCell::new(state));
        let subscription = {
            let state = Rc::downgrade(&state);
            let root = root.clone();
            signal.subscribe(Box::new(move |dark| {
                let Some(state) = state.upgrade() else { return };
                let resolved = {
                    let mut state = state.borrow_mut();
                    if state.preference != ThemePreference::System {
                        return;
                    }
                    state.resolved = ResolvedTheme::from_dark(dark);
                    state.resolved
                };
                // No borrow held here: the root may read the resolver back.
                root.apply(resolved);
                debug!("system appearance applied: {resolved}");
            }))
        };

        ThemeResolver { state, storage, signal, root, subscription }
    }

    pub fn theme(&self) -> ThemePreference {
        self.state.borrow().preference
    }

    /// Alias for [`ThemeResolver::theme`].
    pub fn get_theme(&self) -> ThemePreference {
        self.theme()
    }

    pub fn resolved_theme(&self) -> ResolvedTheme {
        self.state.borrow().resolved
    }

    /// Store, resolve and apply `preference`.
    pub fn set_theme(&self, preference: ThemePreference) {
        let resolved = preference.resolve(self.signal.prefers_dark());
        {
            let mut state = self.state.borrow_mut();
            state.preference = preference;
            state.resolved = resolved;
        }
        if let Err(e) = self.storage.set(THEME_KEY, preference.as_str()) {
            error!("Failed to save theme preference: {e}");
        }
        self.root.apply(resolved);
        debug!("theme set: preference={preference} resolved={resolved}");
    }

    /// Advance to the next preference in the cycle and return it.
    pub fn cycle_theme(&self) -> ThemePreference {
        let next = self.theme().next();
        self.set_theme(next);
        next
    }
}

impl Drop for ThemeResolver {
    fn drop(&mut self) {
        self.signal.unsubscribe(self.subscription);
    }
}
