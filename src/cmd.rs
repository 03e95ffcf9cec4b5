//! Command implementations for the CLI interface.
//!
//! This is the presentation layer: it validates user input, resolves task
//! references, calls into the task store and theme resolver, and prints the
//! resulting state with the palette of the applied theme.

use std::io::{self, BufRead, Write};

use chrono::{DateTime, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::palette::Palette;
use crate::store::TaskStore;
use crate::task::{normalise_description, validate_title, Task, TaskInput, TaskUpdate};
use crate::theme::{RootMarker, ThemePreference, ThemeResolver};

/// Shortest id prefix accepted as a task reference.
const MIN_ID_PREFIX: usize = 4;
const SHORT_ID_LEN: usize = 8;
const LIST_TITLE_WIDTH: usize = 60;

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task (at most 100 characters).
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Create the task already completed.
        #[arg(long)]
        done: bool,
    },

    /// List tasks in creation order.
    List {
        /// Only tasks still open.
        #[arg(long, conflicts_with = "done")]
        pending: bool,
        /// Only completed tasks.
        #[arg(long)]
        done: bool,
    },

    /// View a single task by id, id prefix, list position or title.
    View {
        task: String,
    },

    /// Flip a task between open and completed.
    Toggle {
        task: String,
    },

    /// Update fields on a task.
    Update {
        task: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_desc")]
        desc: Option<String>,
        /// Remove the description.
        #[arg(long)]
        clear_desc: bool,
        /// Mark completed.
        #[arg(long, conflicts_with = "pending")]
        done: bool,
        /// Mark open.
        #[arg(long)]
        pending: bool,
    },

    /// Delete a task.
    Delete {
        task: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show or change the colour theme.
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },

    /// Generate shell completion scripts.
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ThemeAction {
    /// Show the stored preference and the applied theme.
    Show,
    /// Set the preference: light | dark | system.
    Set {
        #[arg(value_enum)]
        preference: ThemePreference,
    },
    /// Advance light -> dark -> system -> light.
    Cycle,
}

/// Print an error and exit with status 1.
fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    std::process::exit(1);
}

fn resolve_or_exit(store: &TaskStore, reference: &str) -> String {
    match resolve_task_ref(store, reference) {
        Ok(id) => id,
        Err(e) => fail(format!("Error resolving task: {e}")),
    }
}

/// Validate and add a task.
pub fn cmd_add(store: &mut TaskStore, title: String, desc: Option<String>, done: bool) {
    let title = match validate_title(&title) {
        Ok(t) => t,
        Err(e) => fail(e),
    };
    let task = store.add_task(TaskInput {
        title,
        description: normalise_description(desc.as_deref()),
        completed: Some(done),
    });
    println!("Added task {}", short_id(&task.id));
}

/// List tasks with an optional completion filter.
pub fn cmd_list(store: &TaskStore, palette: &Palette, pending: bool, done: bool) {
    if store.is_empty() {
        println!("{}", palette.heading("No tasks yet"));
        println!("{}", palette.muted("Start by adding one: tp add \"Buy milk\""));
        return;
    }

    let now = Utc::now();
    let rows = filter_rows(store.tasks(), pending, done);
    if rows.is_empty() {
        let which = if pending { "open" } else { "completed" };
        println!("{}", palette.heading(&format!("No {which} tasks")));
        println!("{}", palette.muted(&format!("{} in total", count_badge(store.len()))));
        return;
    }

    let shown_done = rows.iter().filter(|(_, t)| t.completed).count();
    println!(
        "{}  {}",
        palette.heading(&count_badge(rows.len())),
        palette.muted(&format!("{shown_done} done"))
    );
    for (pos, task) in rows {
        let mark = if task.completed { "[x]" } else { "[ ]" };
        let title = truncate(&task.title, LIST_TITLE_WIDTH);
        let title = if task.completed { palette.done(&title) } else { palette.text(&title) };
        println!(
            "{:>3}  {}  {}  {}  {}",
            pos,
            palette.muted(short_id(&task.id)),
            palette.accent(mark),
            title,
            palette.muted(&format_age(task.created_at, now))
        );
    }
}

/// Tasks passing the completion filter, paired with their 1-based list position.
pub fn filter_rows(tasks: &[Task], pending: bool, done: bool) -> Vec<(usize, &Task)> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| !(pending && t.completed) && !(done && !t.completed))
        .map(|(i, t)| (i + 1, t))
        .collect()
}

/// Show every field of one task.
pub fn cmd_view(store: &TaskStore, palette: &Palette, reference: String) {
    let id = resolve_or_exit(store, &reference);
    let Some(task) = store.get(&id) else {
        fail(format!("Task {id} not found."));
    };
    println!("{}", palette.heading(&task.title));
    println!("ID:          {}", task.id);
    println!("Status:      {}", if task.completed { "Done" } else { "Open" });
    println!(
        "Created:     {} ({})",
        task.created_at.to_rfc3339(),
        format_age(task.created_at, Utc::now())
    );
    match &task.description {
        Some(d) => println!("Description:\n  {}", d),
        None => println!("Description: {}", palette.muted("-")),
    }
}

/// Flip completion on a task.
pub fn cmd_toggle(store: &mut TaskStore, reference: String) {
    let id = resolve_or_exit(store, &reference);
    store.toggle_task(&id);
    let state = match store.get(&id) {
        Some(t) if t.completed => "done",
        _ => "open",
    };
    println!("Task {} is now {}", short_id(&id), state);
}

/// Merge the given fields into a task.
pub fn cmd_update(
    store: &mut TaskStore,
    reference: String,
    title: Option<String>,
    desc: Option<String>,
    clear_desc: bool,
    done: bool,
    pending: bool,
) {
    let id = resolve_or_exit(store, &reference);
    let title = match title.as_deref().map(validate_title).transpose() {
        Ok(t) => t,
        Err(e) => fail(e),
    };
    let description = if clear_desc {
        Some(None)
    } else {
        desc.map(|d| normalise_description(Some(&d)))
    };
    let completed = match (done, pending) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let update = TaskUpdate { title, description, completed };
    if update.is_empty() {
        fail("Nothing to update. Pass --title, --desc, --clear-desc, --done or --pending.");
    }
    store.update_task(&id, update);
    println!("Updated task {}", short_id(&id));
}

/// Delete a task after confirmation.
pub fn cmd_delete(store: &mut TaskStore, reference: String, yes: bool) {
    let id = resolve_or_exit(store, &reference);
    let title = store.get(&id).map(|t| t.title.clone()).unwrap_or_default();
    if !yes && !confirm(&format!("Are you sure you want to delete \"{title}\"?")) {
        println!("Kept.");
        return;
    }
    store.delete_task(&id);
    println!("Deleted.");
}

/// Show, set or cycle the theme preference.
pub fn cmd_theme(
    resolver: &ThemeResolver,
    root: &RootMarker,
    color: bool,
    action: Option<ThemeAction>,
) {
    match action.unwrap_or(ThemeAction::Show) {
        ThemeAction::Show => {}
        ThemeAction::Set { preference } => resolver.set_theme(preference),
        ThemeAction::Cycle => {
            resolver.cycle_theme();
        }
    }
    let palette = Palette::from_root(root, color);
    let preference = resolver.theme();
    println!("{}", palette.heading(preference.label()));
    println!("Preference:  {}", palette.accent(preference.as_str()));
    println!("Applied:     {}", palette.accent(resolver.resolved_theme().as_str()));
    println!("Next:        {}", palette.muted(preference.next().as_str()));
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}

/// Resolve a task reference to an id.
///
/// Tries, in order: exact id, 1-based list position, unique id prefix of at
/// least four characters, then case-insensitive exact title.
pub fn resolve_task_ref(store: &TaskStore, reference: &str) -> Result<String, String> {
    let reference = reference.trim();
    if let Some(task) = store.get(reference) {
        return Ok(task.id.clone());
    }

    if let Ok(pos) = reference.parse::<usize>() {
        if pos >= 1 && pos <= store.len() {
            return Ok(store.tasks()[pos - 1].id.clone());
        }
    }

    if reference.chars().count() >= MIN_ID_PREFIX {
        let prefixed: Vec<&Task> =
            store.tasks().iter().filter(|t| t.id.starts_with(reference)).collect();
        match prefixed.len() {
            0 => {}
            1 => return Ok(prefixed[0].id.clone()),
            n => {
                return Err(format!(
                    "Id prefix '{reference}' matches {n} tasks; use more characters."
                ))
            }
        }
    }

    let wanted = reference.to_lowercase();
    let matches: Vec<&Task> =
        store.tasks().iter().filter(|t| t.title.to_lowercase() == wanted).collect();
    match matches.len() {
        0 => Err(format!("No task found matching '{reference}'")),
        1 => Ok(matches[0].id.clone()),
        _ => {
            let mut error_msg = format!("Multiple tasks found with title '{reference}':\n");
            for task in matches {
                error_msg.push_str(&format!("  {}  {}\n", short_id(&task.id), task.title));
            }
            error_msg.push_str("Please use the id instead.");
            Err(error_msg)
        }
    }
}

/// "1 Task" / "3 Tasks".
pub fn count_badge(n: usize) -> String {
    format!("{} {}", n, if n == 1 { "Task" } else { "Tasks" })
}

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Format a creation time relative to `now` ("just now", "5m ago", "2d ago").
/// Anything older than a week shows the date.
pub fn format_age(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - created).num_seconds();
    if secs < 60 {
        "just now".into()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else if secs < 7 * 86_400 {
        format!("{}d ago", secs / 86_400)
    } else {
        created.format("%Y-%m-%d").to_string()
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::{Duration, TimeZone};
    use std::rc::Rc;

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: id.into(),
            title: title.into(),
            description: None,
            completed: false,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn store() -> TaskStore {
        TaskStore::with_seed(
            Rc::new(MemoryStorage::new()),
            vec![
                task("abcd1234-0000", "Buy milk"),
                task("abce9999-0000", "Walk dog"),
                task("ffff0000-1111", "walk dog"),
            ],
        )
    }

    #[test]
    fn test_resolve_exact_id_and_position() {
        let store = store();
        assert_eq!(resolve_task_ref(&store, "abce9999-0000").unwrap(), "abce9999-0000");
        assert_eq!(resolve_task_ref(&store, "1").unwrap(), "abcd1234-0000");
        assert_eq!(resolve_task_ref(&store, " 3 ").unwrap(), "ffff0000-1111");
    }

    #[test]
    fn test_resolve_prefix() {
        let store = store();
        assert_eq!(resolve_task_ref(&store, "abcd").unwrap(), "abcd1234-0000");
        assert_eq!(resolve_task_ref(&store, "ffff0").unwrap(), "ffff0000-1111");
        let err = resolve_task_ref(&store, "abc").unwrap_err();
        assert!(err.contains("No task found"));
        // Four shared characters are ambiguous.
        let ambiguous = TaskStore::with_seed(
            Rc::new(MemoryStorage::new()),
            vec![task("aaaa1", "x"), task("aaaa2", "y")],
        );
        assert!(resolve_task_ref(&ambiguous, "aaaa").unwrap_err().contains("matches 2"));
    }

    #[test]
    fn test_resolve_title() {
        let store = store();
        assert_eq!(resolve_task_ref(&store, "buy MILK").unwrap(), "abcd1234-0000");
        let err = resolve_task_ref(&store, "Walk dog").unwrap_err();
        assert!(err.contains("Multiple tasks"));
        assert!(err.contains("abce9999"));
        assert!(err.contains("ffff0000"));
    }

    #[test]
    fn test_position_out_of_range_is_not_found() {
        let store = store();
        assert!(resolve_task_ref(&store, "0").is_err());
        assert!(resolve_task_ref(&store, "4").is_err());
    }

    #[test]
    fn test_filter_rows_keeps_positions() {
        let mut tasks = vec![task("a", "one"), task("b", "two"), task("c", "three")];
        tasks[1].completed = true;

        let ids = |rows: Vec<(usize, &Task)>| -> Vec<(usize, String)> {
            rows.into_iter().map(|(p, t)| (p, t.id.clone())).collect()
        };
        let open = [(1, "a".to_string()), (3, "c".to_string())];
        assert_eq!(ids(filter_rows(&tasks, true, false)), open);
        assert_eq!(ids(filter_rows(&tasks, false, true)), [(2, "b".to_string())]);

        assert_eq!(filter_rows(&tasks, false, false).len(), 3);
    }

    #[test]
    fn test_filter_rows_can_be_empty() {
        let tasks = vec![task("a", "one")];
        assert!(filter_rows(&tasks, false, true).is_empty());
        assert_eq!(count_badge(filter_rows(&tasks, true, false).len()), "1 Task");
    }

    #[test]
    fn test_count_badge() {
        assert_eq!(count_badge(0), "0 Tasks");
        assert_eq!(count_badge(1), "1 Task");
        assert_eq!(count_badge(2), "2 Tasks");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_format_age() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(format_age(created, created + Duration::seconds(30)), "just now");
        assert_eq!(format_age(created, created + Duration::minutes(5)), "5m ago");
        assert_eq!(format_age(created, created + Duration::hours(3)), "3h ago");
        assert_eq!(format_age(created, created + Duration::days(2)), "2d ago");
        assert_eq!(format_age(created, created + Duration::days(30)), "2024-05-01");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
