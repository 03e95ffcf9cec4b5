//! # TP - Terminal Task Pad
//!
//! A small command-line task pad: add short tasks, tick them off, delete them.
//! Tasks and the colour theme preference persist between runs.
//!
//! ## Key Features
//!
//! - **Task Store**: ordered task collection mirrored to a storage slot after every change
//! - **Theme Resolver**: light / dark / system preference, resolved against the terminal's
//!   appearance and applied to all output
//! - **Forgiving storage**: unreadable or corrupt files never stop the pad; problems are logged
//!
//! ## Quick Start
//!
//! ```bash
//! tp add "Buy milk" --desc "Two litres"
//! tp list
//! tp toggle 1
//! tp delete "buy milk" --yes
//! tp theme cycle
//! ```
//!
//! Data is stored locally in `~/.taskpad/` (override with `--dir` or `TASKPAD_HOME`):
//! `tasks` holds the task list as JSON, `theme_preference` the bare theme token.

use std::rc::Rc;

use clap::Parser;
use log::info;

pub mod appearance;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod logging;
pub mod palette;
pub mod storage;
pub mod store;
pub mod task;
pub mod theme;

use appearance::SignalHub;
use cli::Cli;
use cmd::*;
use config::Config;
use palette::Palette;
use storage::{FileStorage, Storage};
use store::TaskStore;
use theme::{RootMarker, ThemeResolver};

fn main() {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose);

    // Completions need no storage.
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let config = Config::from_cli(&cli);
    let storage: Rc<dyn Storage> = match FileStorage::open(&config.data_dir) {
        Ok(s) => Rc::new(s),
        Err(e) => {
            eprintln!("Failed to open data directory {}: {}", config.data_dir.display(), e);
            std::process::exit(1);
        }
    };
    info!("using data directory {}", config.data_dir.display());

    let signal = Rc::new(SignalHub::from_system(&config));
    let root = Rc::new(RootMarker::new());
    let resolver = ThemeResolver::new(storage.clone(), signal, root.clone());
    let mut store = TaskStore::open(storage);
    let palette = Palette::from_root(&root, config.color);

    match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),

        Commands::Add { title, desc, done } => cmd_add(&mut store, title, desc, done),

        Commands::List { pending, done } => cmd_list(&store, &palette, pending, done),

        Commands::View { task } => cmd_view(&store, &palette, task),

        Commands::Toggle { task } => cmd_toggle(&mut store, task),

        Commands::Update { task, title, desc, clear_desc, done, pending } => {
            cmd_update(&mut store, task, title, desc, clear_desc, done, pending)
        }

        Commands::Delete { task, yes } => cmd_delete(&mut store, task, yes),

        Commands::Theme { action } => cmd_theme(&resolver, &root, config.color, action),
    }
}
