//! Runtime configuration resolved from flags and environment.
//!
//! Data directory precedence: `--dir`, `TASKPAD_HOME`, `$HOME/.taskpad`, then
//! `./.taskpad`.

use std::path::{Path, PathBuf};

use log::warn;

use crate::cli::Cli;
use crate::theme::ResolvedTheme;

pub const HOME_ENV: &str = "TASKPAD_HOME";
pub const SYSTEM_THEME_ENV: &str = "TASKPAD_SYSTEM_THEME";
const DIR_NAME: &str = ".taskpad";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the storage files.
    pub data_dir: PathBuf,
    /// Forces the system appearance instead of detecting it.
    pub system_theme: Option<ResolvedTheme>,
    /// Whether output may carry colour.
    pub color: bool,
}

impl Config {
    /// Defaults rooted at `dir`.
    pub fn for_dir(dir: &Path) -> Self {
        Config {
            data_dir: dir.to_path_buf(),
            system_theme: None,
            color: true,
        }
    }

    pub fn from_cli(cli: &Cli) -> Self {
        Self::resolve(cli.dir.clone(), cli.no_color, |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary environment lookup.
    pub fn resolve(
        dir_flag: Option<PathBuf>,
        no_color: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());
        let data_dir = dir_flag
            .or_else(|| non_empty(HOME_ENV).map(PathBuf::from))
            .or_else(|| non_empty("HOME").map(|h| PathBuf::from(h).join(DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from(".").join(DIR_NAME));

        let system_theme = env(SYSTEM_THEME_ENV).and_then(|raw| {
            let parsed = ResolvedTheme::parse(&raw);
            if parsed.is_none() {
                warn!("Ignoring {SYSTEM_THEME_ENV}={raw:?}; expected 'light' or 'dark'");
            }
            parsed
        });

        let color = !no_color && env("NO_COLOR").map_or(true, |v| v.is_empty());

        Config { data_dir, system_theme, color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_dir_flag_wins() {
        let env = env_of(&[(HOME_ENV, "/env/pad"), ("HOME", "/home/u")]);
        let config = Config::resolve(Some(PathBuf::from("/flag")), false, env);
        assert_eq!(config.data_dir, PathBuf::from("/flag"));
    }

    #[test]
    fn test_env_then_home_then_cwd() {
        let env = env_of(&[(HOME_ENV, "/env/pad"), ("HOME", "/home/u")]);
        let config = Config::resolve(None, false, env);
        assert_eq!(config.data_dir, PathBuf::from("/env/pad"));

        let config = Config::resolve(None, false, env_of(&[("HOME", "/home/u")]));
        assert_eq!(config.data_dir, PathBuf::from("/home/u/.taskpad"));

        let config = Config::resolve(None, false, env_of(&[]));
        assert_eq!(config.data_dir, PathBuf::from("./.taskpad"));
    }

    #[test]
    fn test_system_theme_override() {
        let config = Config::resolve(None, false, env_of(&[(SYSTEM_THEME_ENV, "Dark")]));
        assert_eq!(config.system_theme, Some(ResolvedTheme::Dark));

        let config = Config::resolve(None, false, env_of(&[(SYSTEM_THEME_ENV, "purple")]));
        assert_eq!(config.system_theme, None);
    }

    #[test]
    fn test_color_switches() {
        assert!(Config::resolve(None, false, env_of(&[])).color);
        assert!(!Config::resolve(None, true, env_of(&[])).color);
        assert!(!Config::resolve(None, false, env_of(&[("NO_COLOR", "1")])).color);
        assert!(Config::resolve(None, false, env_of(&[("NO_COLOR", "")])).color);
    }
}
