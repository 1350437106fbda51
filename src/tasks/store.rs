//! In-memory task storage.
//!
//! A flat list guarded by a read-write lock; lookups are linear scans.
//!
//! An optional count observer sees the new length of every insert, removal
//! and clear while the write lock is still held, so observed counts arrive
//! in the same order as the mutations.

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::tasks::types::{Task, TaskDraft};

type CountObserver = Box<dyn Fn(usize) + Send + Sync>;

#[derive(Default)]
pub struct TaskStore {
    tasks: RwLock<Vec<Task>>,
    on_count: Option<CountObserver>,
}

impl fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStore")
            .field("len", &self.len())
            .field("observed", &self.on_count.is_some())
            .finish()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that reports its length to `observer` after every change
    /// in size.
    pub fn with_count_observer(observer: impl Fn(usize) + Send + Sync + 'static) -> Self {
        Self {
            tasks: RwLock::default(),
            on_count: Some(Box::new(observer)),
        }
    }

    fn observe(&self, tasks: &[Task]) {
        if let Some(observer) = &self.on_count {
            observer(tasks.len());
        }
    }

    /// Report the current length again, e.g. after the observer's own
    /// state was wiped.
    pub fn publish_count(&self) {
        let tasks = self.write();
        self.observe(&tasks);
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Task>> {
        self.tasks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Task>> {
        self.tasks.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a new task and return it.
    pub fn create(&self, draft: TaskDraft) -> Task {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        let mut tasks = self.write();
        tasks.push(task.clone());
        self.observe(&tasks);
        task
    }

    /// All tasks, newest first. Tasks created at the same instant keep
    /// reverse insertion order.
    pub fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.read().iter().rev().cloned().collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.read().iter().any(|t| t.id == id)
    }

    /// Replace title and description.
    pub fn update(&self, id: Uuid, draft: TaskDraft) -> Option<Task> {
        let mut tasks = self.write();
        let task = tasks.iter_mut().find(|t| t.id == id)?;
        task.title = draft.title;
        task.description = draft.description;
        task.updated_at = Utc::now();
        Some(task.clone())
    }

    pub fn set_completed(&self, id: Uuid, completed: bool) -> Option<Task> {
        let mut tasks = self.write();
        let task = tasks.iter_mut().find(|t| t.id == id)?;
        task.completed = completed;
        task.updated_at = Utc::now();
        Some(task.clone())
    }

    pub fn delete(&self, id: Uuid) -> Option<Task> {
        let mut tasks = self.write();
        let index = tasks.iter().position(|t| t.id == id)?;
        let task = tasks.remove(index);
        self.observe(&tasks);
        Some(task)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        let mut tasks = self.write();
        tasks.clear();
        self.observe(&tasks);
    }
}
