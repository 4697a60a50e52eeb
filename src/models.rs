use serde::{Deserialize, Serialize};

pub type Timestamp = i64;

pub const UNTITLED_TASK_TITLE: &str = "Untitled Task";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: Timestamp,
    // Assigned by the remote adapter from the active session; the UI never
    // sets it.
    #[serde(default)]
    pub user_id: String,
}

/// Partial update merged onto an existing task by the state store.
/// `id`, `created_at` and `user_id` are immutable and have no patch fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(details) = &self.details {
            task.details = details.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    pub service_url: String,
    pub service_anon_key: String,
    pub theme: String,
    // Static capability flag for the optional underline extension of the
    // rich-text widget; the frontend reads it instead of probing at runtime.
    #[serde(default = "default_editor_underline")]
    pub editor_underline: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_url: String::new(),
            service_anon_key: String::new(),
            theme: "light".to_string(),
            editor_underline: default_editor_underline(),
        }
    }
}

fn default_editor_underline() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TasksFile {
    pub schema_version: u32,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SettingsFile {
    pub schema_version: u32,
    pub settings: Settings,
}
