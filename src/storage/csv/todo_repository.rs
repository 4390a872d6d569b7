use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use super::connection::CsvConnection;
use crate::domain::models::todo::{ReminderKind, Todo, TodoStatus};
use crate::storage::traits::TodoStorage;

const TODOS_FILE: &str = "todos.csv";

/// Intermediate row struct for CSV serialization; the kind and status enums
/// are stored as their string codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvTodo {
    id: String,
    cat_id: String,
    kind: String,
    content: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl CsvTodo {
    fn from_domain(todo: &Todo) -> Self {
        Self {
            id: todo.id.clone(),
            cat_id: todo.cat_id.clone(),
            kind: todo.kind.to_string(),
            content: todo.content.clone(),
            status: todo.status.to_string(),
            created_at: todo.created_at.to_rfc3339(),
            updated_at: todo.updated_at.to_rfc3339(),
        }
    }

    fn into_domain(self) -> Result<Todo> {
        let kind = ReminderKind::from_string(&self.kind)
            .map_err(|e| anyhow::anyhow!("{} in to-do {}", e, self.id))?;
        let status = TodoStatus::from_string(&self.status)
            .map_err(|e| anyhow::anyhow!("{} in to-do {}", e, self.id))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("Invalid created_at in to-do {}", self.id))?
            .with_timezone(&Utc);
        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .with_context(|| format!("Invalid updated_at in to-do {}", self.id))?
            .with_timezone(&Utc);

        Ok(Todo {
            id: self.id,
            cat_id: self.cat_id,
            kind,
            content: self.content,
            status,
            created_at,
            updated_at,
        })
    }
}

/// CSV-based to-do repository backed by a single `todos.csv` file
#[derive(Clone)]
pub struct TodoRepository {
    connection: Arc<CsvConnection>,
}

impl TodoRepository {
    /// Create a new CSV to-do repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    fn file_path(&self) -> PathBuf {
        self.connection.collection_path(TODOS_FILE)
    }

    fn read_todos(&self) -> Result<Vec<Todo>> {
        let file_path = self.file_path();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)
            .with_context(|| format!("Failed to open {:?}", file_path))?;
        let mut rdr = csv::Reader::from_reader(file);
        let mut todos = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvTodo = row.context("Malformed row in todos.csv")?;
            todos.push(row.into_domain()?);
        }
        Ok(todos)
    }

    fn write_todos(&self, todos: &[Todo]) -> Result<()> {
        let file_path = self.file_path();
        let temp_path = file_path.with_extension("tmp");
        {
            let mut wtr = csv::Writer::from_path(&temp_path)
                .with_context(|| format!("Failed to create {:?}", temp_path))?;
            for todo in todos {
                wtr.serialize(CsvTodo::from_domain(todo))?;
            }
            wtr.flush()?;
        }
        fs::rename(&temp_path, &file_path)?;
        debug!("Wrote {} to-dos to {:?}", todos.len(), file_path);
        Ok(())
    }
}

impl TodoStorage for TodoRepository {
    fn store_todo(&self, todo: &Todo) -> Result<()> {
        let mut todos = self.read_todos()?;
        todos.push(todo.clone());
        self.write_todos(&todos)
    }

    fn get_todo(&self, todo_id: &str) -> Result<Option<Todo>> {
        let todos = self.read_todos()?;
        Ok(todos.into_iter().find(|t| t.id == todo_id))
    }

    fn list_todos_for_cat(&self, cat_id: &str) -> Result<Vec<Todo>> {
        let todos = self.read_todos()?;
        Ok(todos.into_iter().filter(|t| t.cat_id == cat_id).collect())
    }

    fn list_pending_todos(&self) -> Result<Vec<Todo>> {
        let todos = self.read_todos()?;
        Ok(todos
            .into_iter()
            .filter(|t| t.status == TodoStatus::Pending)
            .collect())
    }

    fn update_todo(&self, todo: &Todo) -> Result<()> {
        let mut todos = self.read_todos()?;
        let slot = todos
            .iter_mut()
            .find(|t| t.id == todo.id)
            .ok_or_else(|| anyhow::anyhow!("To-do not found: {}", todo.id))?;
        *slot = todo.clone();
        self.write_todos(&todos)
    }

    fn delete_todo(&self, todo_id: &str) -> Result<bool> {
        let mut todos = self.read_todos()?;
        let before = todos.len();
        todos.retain(|t| t.id != todo_id);
        if todos.len() == before {
            return Ok(false);
        }
        self.write_todos(&todos)?;
        Ok(true)
    }

    fn delete_todos_for_cat(&self, cat_id: &str) -> Result<u32> {
        let mut todos = self.read_todos()?;
        let before = todos.len();
        todos.retain(|t| t.cat_id != cat_id);
        let deleted = (before - todos.len()) as u32;
        if deleted > 0 {
            self.write_todos(&todos)?;
        }
        Ok(deleted)
    }
}
