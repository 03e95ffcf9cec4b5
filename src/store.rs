//! The task store: the canonical, ordered task collection mirrored to storage.
//!
//! All operations are synchronous and visible to the next read. Lookup misses
//! are silent no-ops. Persistence problems are logged and never reach the
//! caller; the in-memory collection stays authoritative for the session.

use std::rc::Rc;

use chrono::Utc;
use log::{debug, error, warn};
use uuid::Uuid;

use crate::storage::{Storage, StorageError, TASKS_KEY};
use crate::task::{Task, TaskInput, TaskUpdate};

/// In-memory task collection in insertion order, backed by a storage slot.
pub struct TaskStore {
    tasks: Vec<Task>,
    storage: Rc<dyn Storage>,
}

impl TaskStore {
    /// Load the persisted collection, starting empty when there is none.
    pub fn open(storage: Rc<dyn Storage>) -> Self {
        Self::with_seed(storage, Vec::new())
    }

    /// Load the persisted collection, starting from `seed` when nothing usable is stored.
    pub fn with_seed(storage: Rc<dyn Storage>, seed: Vec<Task>) -> Self {
        let tasks = load_tasks(storage.as_ref()).unwrap_or(seed);
        debug!("task store opened with {} task(s)", tasks.len());
        TaskStore { tasks, storage }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Create a task from `input`, append it, and return the stored copy.
    ///
    /// The title is taken as given; trimming and length checks belong to the caller.
    pub fn add_task(&mut self, input: TaskInput) -> Task {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            completed: input.completed.unwrap_or(false),
            created_at: Utc::now(),
        };
        debug!("adding task {}", task.id);
        self.tasks.push(task.clone());
        self.persist();
        task
    }

    /// Flip `completed` on the task with `id`.
    pub fn toggle_task(&mut self, id: &str) {
        let Some(task) = self.get_mut(id) else {
            debug!("toggle: no task {id}");
            return;
        };
        task.completed = !task.completed;
        debug!("toggled task {id} to completed={}", task.completed);
        self.persist();
    }

    /// Remove the task with `id`, keeping the order of the rest.
    pub fn delete_task(&mut self, id: &str) {
        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            debug!("delete: no task {id}");
            return;
        };
        self.tasks.remove(idx);
        debug!("deleted task {id}");
        self.persist();
    }

    /// Merge `update` into the task with `id`. `id` and `created_at` never change.
    pub fn update_task(&mut self, id: &str, update: TaskUpdate) {
        let Some(task) = self.get_mut(id) else {
            debug!("update: no task {id}");
            return;
        };
        update.apply_to(task);
        debug!("updated task {id}");
        self.persist();
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    fn persist(&self) {
        if let Err(e) = save_tasks(self.storage.as_ref(), &self.tasks) {
            error!("Failed to save tasks: {e}");
        }
    }
}

/// Read and decode the task slot. `None` when absent, unreadable or corrupt.
fn load_tasks(storage: &dyn Storage) -> Option<Vec<Task>> {
    let raw = match storage.get(TASKS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Error reading tasks, starting fresh: {e}");
            return None;
        }
    };
    match serde_json::from_str::<Vec<Task>>(&raw) {
        Ok(tasks) => Some(tasks),
        Err(e) => {
            warn!("Error parsing tasks, starting fresh: {e}");
            None
        }
    }
}

fn save_tasks(storage: &dyn Storage, tasks: &[Task]) -> Result<(), StorageError> {
    let data = serde_json::to_string(tasks).map_err(|source| StorageError::Serialize {
        key: TASKS_KEY.to_string(),
        source,
    })?;
    storage.set(TASKS_KEY, &data)
}
