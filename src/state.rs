use std::sync::{Arc, Mutex};

use crate::editor::EditorMode;
use crate::list::SearchOverlay;
use crate::models::{Settings, SettingsFile, Task, TaskPatch, TasksFile};

const SCHEMA_VERSION: u32 = 1;

/// Session-wide state container. Constructed once at startup and handed to
/// the command layer by the runtime; holds the authoritative task list, the
/// persisted settings, and the transient editor/search UI state.
///
/// Task mutations return the new collection snapshot so callers can hand the
/// fresh list root to the display layer without a second lock.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(tasks: Vec<Task>, settings: Settings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AppData {
                tasks,
                settings,
                editor: EditorMode::Empty,
                search: SearchOverlay::default(),
            })),
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.tasks.clone()
    }

    pub fn tasks_file(&self) -> TasksFile {
        let guard = self.inner.lock().expect("state poisoned");
        TasksFile {
            schema_version: SCHEMA_VERSION,
            tasks: guard.tasks.clone(),
        }
    }

    pub fn settings_file(&self) -> SettingsFile {
        let guard = self.inner.lock().expect("state poisoned");
        SettingsFile {
            schema_version: SCHEMA_VERSION,
            settings: guard.settings.clone(),
        }
    }

    pub fn set_all(&self, tasks: Vec<Task>) -> Vec<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.tasks = tasks;
        guard.tasks.clone()
    }

    // Blind append: duplicate ids are the caller's responsibility (the only
    // internal caller adds a task once per remote create acknowledgment).
    pub fn add_task(&self, task: Task) -> Vec<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.tasks.push(task);
        guard.tasks.clone()
    }

    pub fn remove_task(&self, task_id: &str) -> Vec<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.tasks.retain(|task| task.id != task_id);
        guard.tasks.clone()
    }

    pub fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Vec<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        if let Some(existing) = guard.tasks.iter_mut().find(|t| t.id == task_id) {
            patch.apply(existing);
        }
        guard.tasks.clone()
    }

    pub fn find_by_id(&self, task_id: &str) -> Option<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.tasks.iter().find(|t| t.id == task_id).cloned()
    }

    pub fn settings(&self) -> Settings {
        let guard = self.inner.lock().expect("state poisoned");
        guard.settings.clone()
    }

    pub fn update_settings(&self, settings: Settings) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.settings = settings;
    }

    pub fn editor(&self) -> EditorMode {
        let guard = self.inner.lock().expect("state poisoned");
        guard.editor.clone()
    }

    pub fn set_editor(&self, mode: EditorMode) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.editor = mode;
    }

    pub fn search(&self) -> SearchOverlay {
        let guard = self.inner.lock().expect("state poisoned");
        guard.search.clone()
    }

    pub fn open_search(&self) -> SearchOverlay {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.search.open();
        guard.search.clone()
    }

    pub fn close_search(&self) -> SearchOverlay {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.search.close();
        guard.search.clone()
    }

    pub fn set_search_query(&self, query: String) -> SearchOverlay {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.search.set_query(query);
        guard.search.clone()
    }
}

#[derive(Debug)]
struct AppData {
    tasks: Vec<Task>,
    settings: Settings,
    editor: EditorMode,
    search: SearchOverlay,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            details: String::new(),
            completed: false,
            created_at: 1,
            user_id: "u1".to_string(),
        }
    }

    #[test]
    fn tasks_file_includes_schema_version() {
        let state = AppState::new(Vec::new(), Settings::default());
        let file = state.tasks_file();
        assert_eq!(file.schema_version, SCHEMA_VERSION);
        assert!(file.tasks.is_empty());

        let settings_file = state.settings_file();
        assert_eq!(settings_file.schema_version, SCHEMA_VERSION);
        assert_eq!(settings_file.settings.theme, "light");
    }

    #[test]
    fn mutations_return_the_new_collection() {
        let state = AppState::new(Vec::new(), Settings::default());

        let after_add = state.add_task(make_task("a", "first"));
        assert_eq!(after_add.len(), 1);

        let after_set = state.set_all(vec![make_task("x", "only")]);
        assert_eq!(after_set.len(), 1);
        assert_eq!(after_set[0].id, "x");

        let after_remove = state.remove_task("x");
        assert!(after_remove.is_empty());
    }

    #[test]
    fn update_task_merges_patch_and_ignores_missing_ids() {
        let state = AppState::new(vec![make_task("a", "old")], Settings::default());

        let patch = TaskPatch {
            title: Some("new".to_string()),
            details: Some("body".to_string()),
            completed: None,
        };
        let out = state.update_task("a", &patch);
        assert_eq!(out[0].title, "new");
        assert_eq!(out[0].details, "body");
        assert!(!out[0].completed);

        // Missing id is a no-op.
        let out = state.update_task("missing", &patch);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "new");
    }

    #[test]
    fn remove_task_is_a_no_op_on_absent_ids() {
        let state = AppState::new(vec![make_task("a", "one")], Settings::default());
        assert_eq!(state.remove_task("missing").len(), 1);
        assert!(state.remove_task("a").is_empty());
        assert!(state.remove_task("a").is_empty());
    }

    #[test]
    fn find_by_id_returns_none_when_absent() {
        let state = AppState::new(vec![make_task("a", "one")], Settings::default());
        assert_eq!(state.find_by_id("a").unwrap().title, "one");
        assert!(state.find_by_id("b").is_none());
    }

    // Pins down the deliberate lack of a duplicate-id guard on add: the store
    // trusts its caller, like the reducer it replaces.
    #[test]
    fn add_task_does_not_deduplicate_ids() {
        let state = AppState::new(Vec::new(), Settings::default());
        state.add_task(make_task("a", "one"));
        let out = state.add_task(make_task("a", "two"));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn editor_mode_round_trips() {
        let state = AppState::new(Vec::new(), Settings::default());
        assert_eq!(state.editor(), EditorMode::Empty);
        state.set_editor(EditorMode::EditingExisting {
            id: "a".to_string(),
        });
        assert_eq!(
            state.editor(),
            EditorMode::EditingExisting {
                id: "a".to_string()
            }
        );
    }

    #[test]
    fn search_overlay_transitions() {
        let state = AppState::new(Vec::new(), Settings::default());
        assert!(!state.search().open);

        let overlay = state.open_search();
        assert!(overlay.open);

        let overlay = state.set_search_query("milk".to_string());
        assert_eq!(overlay.query, "milk");

        let overlay = state.close_search();
        assert!(!overlay.open);
        assert!(overlay.query.is_empty());
    }

    #[test]
    fn update_settings_replaces_previous_value() {
        let state = AppState::new(Vec::new(), Settings::default());
        let mut next = Settings::default();
        next.theme = "dark".to_string();
        state.update_settings(next);
        assert_eq!(state.settings().theme, "dark");
    }
}
