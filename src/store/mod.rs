//! In-memory task store.
//!
//! Stands in for the relational store the deployment would use; the piece
//! that matters here is the write path's contract with the notification
//! core: every committed create/update invokes the [`TaskObserver`] exactly
//! once, after the mutation is applied, and never fails because of it.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;

use crate::errors::StoreError;
use crate::models::{Comment, Task, TaskStatus};
use crate::notify::TaskObserver;

/// Fields for a task create.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: Option<chrono::NaiveDate>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<i64>,
    pub created_by: Option<i64>,
    pub tags: Vec<String>,
}

/// Field-by-field changes for a task update. `None` leaves a field alone;
/// `assigned_to: Some(None)` clears the assignee.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<chrono::NaiveDate>>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Option<i64>>,
}

struct Inner {
    tasks: HashMap<i64, Task>,
    comments: HashMap<i64, Comment>,
    next_task_id: i64,
    next_comment_id: i64,
}

pub struct TaskStore {
    inner: Mutex<Inner>,
    observer: TaskObserver,
}

impl TaskStore {
    pub fn new(observer: TaskObserver) -> Self {
        Self {
            inner: Mutex::new(Inner {
                tasks: HashMap::new(),
                comments: HashMap::new(),
                next_task_id: 1,
                next_comment_id: 1,
            }),
            observer,
        }
    }

    pub fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        let task = {
            let mut inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
            let id = inner.next_task_id;
            inner.next_task_id += 1;
            let task = Task {
                id,
                title: new.title,
                description: new.description,
                due_date: new.due_date,
                status: new.status.unwrap_or_default(),
                assigned_to: new.assigned_to,
                created_by: new.created_by,
                created_at: Utc::now(),
                tags: new.tags,
            };
            inner.tasks.insert(id, task.clone());
            task
        };

        // Post-commit hook, outside the store lock.
        self.observer.on_task_committed(&task.snapshot(), true, None);
        Ok(task)
    }

    pub fn get_task(&self, id: i64) -> Result<Task, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        inner
            .tasks
            .get(&id)
            .cloned()
            .ok_or(StoreError::TaskNotFound { id })
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut tasks: Vec<Task> = inner.tasks.values().cloned().collect();
        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }

    /// Applies `changes` and fires the observer once. `changed_fields` is
    /// the caller's declaration of which fields the write touches; `None`
    /// marks a full/unspecified update.
    pub fn update_task(
        &self,
        id: i64,
        changes: TaskChanges,
        changed_fields: Option<HashSet<String>>,
    ) -> Result<Task, StoreError> {
        let task = {
            let mut inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
            let task = inner
                .tasks
                .get_mut(&id)
                .ok_or(StoreError::TaskNotFound { id })?;
            if let Some(title) = changes.title {
                task.title = title;
            }
            if let Some(description) = changes.description {
                task.description = description;
            }
            if let Some(due_date) = changes.due_date {
                task.due_date = due_date;
            }
            if let Some(status) = changes.status {
                task.status = status;
            }
            if let Some(assigned_to) = changes.assigned_to {
                task.assigned_to = assigned_to;
            }
            task.clone()
        };

        self.observer
            .on_task_committed(&task.snapshot(), false, changed_fields.as_ref());
        Ok(task)
    }

    /// Adds tags by name, creating unknown ones, skipping duplicates.
    /// Commits as a full save with no declared changed-field set, so the
    /// assignee receives a generic update push.
    pub fn add_tags(&self, id: i64, names: Vec<String>) -> Result<Task, StoreError> {
        let task = {
            let mut inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
            let task = inner
                .tasks
                .get_mut(&id)
                .ok_or(StoreError::TaskNotFound { id })?;
            for name in names {
                if !task.tags.contains(&name) {
                    task.tags.push(name);
                }
            }
            task.clone()
        };

        self.observer.on_task_committed(&task.snapshot(), false, None);
        Ok(task)
    }

    pub fn delete_task(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        inner
            .tasks
            .remove(&id)
            .ok_or(StoreError::TaskNotFound { id })?;
        // Comments follow their task.
        inner.comments.retain(|_, c| c.task_id != id);
        Ok(())
    }

    // ── Comments ──────────────────────────────────────────────────────

    /// Comment writes touch no task row, so no notification fires.
    pub fn create_comment(&self, task_id: i64, user: i64, content: String) -> Result<Comment, StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        if !inner.tasks.contains_key(&task_id) {
            return Err(StoreError::TaskNotFound { id: task_id });
        }
        let id = inner.next_comment_id;
        inner.next_comment_id += 1;
        let comment = Comment {
            id,
            task_id,
            user,
            content,
            created_at: Utc::now(),
        };
        inner.comments.insert(id, comment.clone());
        Ok(comment)
    }

    pub fn list_comments(&self, task_id: i64) -> Result<Vec<Comment>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        if !inner.tasks.contains_key(&task_id) {
            return Err(StoreError::TaskNotFound { id: task_id });
        }
        let mut comments: Vec<Comment> = inner
            .comments
            .values()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.id);
        Ok(comments)
    }

    pub fn get_comment(&self, id: i64) -> Result<Comment, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        inner
            .comments
            .get(&id)
            .cloned()
            .ok_or(StoreError::CommentNotFound { id })
    }

    pub fn update_comment(&self, id: i64, content: String) -> Result<Comment, StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        let comment = inner
            .comments
            .get_mut(&id)
            .ok_or(StoreError::CommentNotFound { id })?;
        comment.content = content;
        Ok(comment.clone())
    }

    pub fn delete_comment(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        inner
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::CommentNotFound { id })
    }
}
