//! External light/dark signal.
//!
//! The operating environment reports whether a dark appearance is preferred and
//! announces changes to subscribers. `SignalHub` is the in-process source the
//! binary and the tests both drive.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::debug;

use crate::config::Config;
use crate::theme::ResolvedTheme;

/// Handle returned by `subscribe`, passed back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// "Is dark preferred" query plus change notification.
pub trait AppearanceSignal {
    fn prefers_dark(&self) -> bool;

    /// Register `listener`; it receives the new value on every change.
    fn subscribe(&self, listener: Box<dyn Fn(bool)>) -> SubscriptionId;

    /// Remove a listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

type Listener = Rc<dyn Fn(bool)>;

/// Broadcasting signal source holding the current value.
pub struct SignalHub {
    dark: Cell<bool>,
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
}

impl SignalHub {
    pub fn new(prefers_dark: bool) -> Self {
        SignalHub {
            dark: Cell::new(prefers_dark),
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Seeded from the detected system appearance.
    pub fn from_system(config: &Config) -> Self {
        Self::new(detect_system_dark(config))
    }

    /// Report a new value. Listeners run only when it differs from the current one.
    pub fn set_prefers_dark(&self, dark: bool) {
        if self.dark.replace(dark) == dark {
            return;
        }
        debug!("system appearance changed: dark={dark}");
        // Snapshot so a listener may subscribe or unsubscribe while we iterate.
        let listeners: Vec<Listener> =
            self.listeners.borrow().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(dark);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl AppearanceSignal for SignalHub {
    fn prefers_dark(&self) -> bool {
        self.dark.get()
    }

    fn subscribe(&self, listener: Box<dyn Fn(bool)>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::from(listener)));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().retain(|(sid, _)| *sid != id);
    }
}

/// Best guess at the environment's appearance.
///
/// The configured override wins, then the terminal's `COLORFGBG`, else light.
pub fn detect_system_dark(config: &Config) -> bool {
    if let Some(theme) = config.system_theme {
        return theme == ResolvedTheme::Dark;
    }
    match std::env::var("COLORFGBG") {
        Ok(value) => colorfgbg_is_dark(&value).unwrap_or(false),
        Err(_) => false,
    }
}

/// Interpret a `COLORFGBG` value such as `"15;0"` or `"0;default;15"`.
/// The last field is the background palette index.
pub fn colorfgbg_is_dark(value: &str) -> Option<bool> {
    let bg = value.rsplit(';').next()?.trim().parse::<u8>().ok()?;
    Some(matches!(bg, 0..=6 | 8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorfgbg() {
        assert_eq!(colorfgbg_is_dark("15;0"), Some(true));
        assert_eq!(colorfgbg_is_dark("0;15"), Some(false));
        assert_eq!(colorfgbg_is_dark("0;default;8"), Some(true));
        assert_eq!(colorfgbg_is_dark("12;7"), Some(false));
        assert_eq!(colorfgbg_is_dark("default"), None);
        assert_eq!(colorfgbg_is_dark(""), None);
    }

    #[test]
    fn test_override_wins() {
        let mut config = Config::for_dir(std::path::Path::new("/tmp/unused"));
        config.system_theme = Some(ResolvedTheme::Dark);
        assert!(detect_system_dark(&config));
        config.system_theme = Some(ResolvedTheme::Light);
        assert!(!detect_system_dark(&config));
    }

    #[test]
    fn test_notifies_only_on_change() {
        let hub = SignalHub::new(false);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        hub.subscribe(Box::new(move |dark| sink.borrow_mut().push(dark)));

        hub.set_prefers_dark(false);
        hub.set_prefers_dark(true);
        hub.set_prefers_dark(true);
        hub.set_prefers_dark(false);

        assert_eq!(*seen.borrow(), [true, false]);
        assert!(!hub.prefers_dark());
    }

    #[test]
    fn test_unsubscribe() {
        let hub = SignalHub::new(false);
        let hits = Rc::new(Cell::new(0));
        let a = {
            let hits = hits.clone();
            hub.subscribe(Box::new(move |_| hits.set(hits.get() + 1)))
        };
        let b = {
            let hits = hits.clone();
            hub.subscribe(Box::new(move |_| hits.set(hits.get() + 10)))
        };
        assert_ne!(a, b);
        assert_eq!(hub.listener_count(), 2);

        hub.unsubscribe(a);
        hub.unsubscribe(a);
        assert_eq!(hub.listener_count(), 1);

        hub.set_prefers_dark(true);
        assert_eq!(hits.get(), 10);

        hub.unsubscribe(b);
        assert_eq!(hub.listener_count(), 0);
    }
}
