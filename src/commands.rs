use std::path::PathBuf;

use chrono::Utc;

use crate::editor::{self, EditorMode, TaskIdentity};
use crate::events::StatePayload;
use crate::list::{filter_tasks, SearchOverlay};
use crate::models::{Settings, Task, TaskPatch};
use crate::remote::TaskRemote;
use crate::session::{AuthUser, SessionService, SignUpOutcome};
use crate::state::AppState;
use crate::storage::{Storage, StorageError};

#[cfg(all(feature = "app", not(test)))]
use crate::events::EVENT_STATE_UPDATED;
#[cfg(all(feature = "app", not(test)))]
use tauri::{AppHandle, Emitter, Manager, State};

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EditorState {
    #[serde(flatten)]
    pub mode: EditorMode,
    pub task: Option<Task>,
}

trait CommandCtx {
    fn app_data_dir(&self) -> Result<PathBuf, StorageError>;
    fn emit_state_updated(&self, payload: StatePayload);
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

// Mirror writes are best-effort: device storage trouble must never take down
// the session, so the in-memory state stays authoritative and the failure
// only reaches the operational log.
fn persist(ctx: &impl CommandCtx, state: &AppState) {
    if let Err(error) = write_mirror(ctx, state) {
        log::warn!("mirror write failed, keeping in-memory state: {error}");
    }
    ctx.emit_state_updated(StatePayload {
        tasks: state.tasks(),
        settings: state.settings(),
    });
}

fn write_mirror(ctx: &impl CommandCtx, state: &AppState) -> Result<(), StorageError> {
    let root = ctx.app_data_dir()?;
    let storage = Storage::new(root);
    storage.ensure_dirs()?;
    storage.save_tasks(&state.tasks_file())?;
    storage.save_settings(&state.settings_file())?;
    Ok(())
}

fn load_state_impl(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<StatePayload> {
    match ctx.app_data_dir() {
        Ok(root) => {
            let storage = Storage::new(root);
            let tasks = storage.load_tasks().map(|data| data.tasks).unwrap_or_else(|error| {
                // Covers both a missing and a corrupted mirror: the session
                // starts empty instead of crashing.
                log::warn!("task mirror unreadable, starting empty: {error}");
                Vec::new()
            });
            let settings = storage
                .load_settings()
                .map(|data| data.settings)
                .unwrap_or_else(|error| {
                    log::warn!("settings unreadable, using defaults: {error}");
                    Settings::default()
                });
            state.set_all(tasks);
            state.update_settings(settings);
        }
        Err(error) => log::warn!("app data dir unavailable, starting empty: {error}"),
    }
    ok(StatePayload {
        tasks: state.tasks(),
        settings: state.settings(),
    })
}

fn visible_tasks_impl(state: &AppState) -> CommandResult<Vec<Task>> {
    let query = state.search().query;
    ok(filter_tasks(&state.tasks(), &query))
}

fn open_editor_impl(state: &AppState, task_id: &str) -> CommandResult<EditorState> {
    let Some(task) = state.find_by_id(task_id) else {
        return err("task not found");
    };
    let mode = EditorMode::EditingExisting {
        id: task.id.clone(),
    };
    state.set_editor(mode.clone());
    ok(EditorState {
        mode,
        task: Some(task),
    })
}

fn new_task_editor_impl(state: &AppState) -> CommandResult<EditorState> {
    state.set_editor(EditorMode::EditingNew);
    ok(EditorState {
        mode: EditorMode::EditingNew,
        task: None,
    })
}

fn clear_editor_impl(state: &AppState) -> CommandResult<EditorState> {
    state.set_editor(EditorMode::Empty);
    ok(EditorState {
        mode: EditorMode::Empty,
        task: None,
    })
}

async fn save_editor_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    remote: &dyn TaskRemote,
    raw_title: &str,
    details_doc: &str,
) -> CommandResult<Option<Task>> {
    // Blank tasks are never persisted.
    let Some(input) = editor::prepare_save(raw_title, details_doc) else {
        return ok(None);
    };

    match state.editor().identity() {
        TaskIdentity::Draft => {
            let task = Task {
                id: editor::mint_task_id(),
                title: input.title,
                details: input.details,
                completed: false,
                created_at: Utc::now().timestamp(),
                // Filled in by the adapter from the active session.
                user_id: String::new(),
            };
            // Local state only changes after the store confirms the insert;
            // the confirmed row may carry a store-assigned id.
            match remote.create(&task).await {
                Some(confirmed) => {
                    state.add_task(confirmed.clone());
                    state.set_editor(EditorMode::EditingExisting {
                        id: confirmed.id.clone(),
                    });
                    persist(ctx, state);
                    ok(Some(confirmed))
                }
                None => err("save failed"),
            }
        }
        TaskIdentity::Persisted(id) => {
            if !remote.update(&id, &input.title, &input.details).await {
                return err("save failed");
            }
            let patch = TaskPatch {
                title: Some(input.title),
                details: Some(input.details),
                completed: None,
            };
            state.update_task(&id, &patch);
            persist(ctx, state);
            ok(state.find_by_id(&id))
        }
    }
}

async fn delete_editor_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    remote: &dyn TaskRemote,
) -> CommandResult<bool> {
    let EditorMode::EditingExisting { id } = state.editor() else {
        return err("no task selected");
    };
    if !remote.delete(&id).await {
        return err("delete failed");
    }
    state.remove_task(&id);
    state.set_editor(EditorMode::Empty);
    persist(ctx, state);
    ok(true)
}

async fn toggle_completion_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    remote: &dyn TaskRemote,
    task_id: &str,
) -> CommandResult<bool> {
    let Some(task) = state.find_by_id(task_id) else {
        return err("task not found");
    };
    // No optimistic flip: the store's answer is what the list renders.
    match remote.toggle_completion(task_id, task.completed).await {
        Some(new_status) => {
            let patch = TaskPatch {
                completed: Some(new_status),
                ..TaskPatch::default()
            };
            state.update_task(task_id, &patch);
            persist(ctx, state);
            ok(new_status)
        }
        None => err("toggle failed"),
    }
}

fn open_search_impl(state: &AppState) -> CommandResult<SearchOverlay> {
    ok(state.open_search())
}

fn close_search_impl(state: &AppState) -> CommandResult<SearchOverlay> {
    ok(state.close_search())
}

fn set_search_query_impl(state: &AppState, query: String) -> CommandResult<SearchOverlay> {
    ok(state.set_search_query(query))
}

async fn sign_in_impl(
    session: &dyn SessionService,
    email: &str,
    password: &str,
) -> CommandResult<AuthUser> {
    match session.sign_in(email, password).await {
        Ok(user) => ok(user),
        // Service wording goes to the user verbatim.
        Err(message) => err(&message),
    }
}

async fn sign_up_impl(
    session: &dyn SessionService,
    full_name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> CommandResult<SignUpOutcome> {
    if password != confirm_password {
        return err("Passwords do not match!");
    }
    match session.sign_up(full_name, email, password).await {
        Ok(outcome) => ok(outcome),
        Err(message) => err(&message),
    }
}

async fn sign_out_impl(session: &dyn SessionService) -> CommandResult<bool> {
    session.sign_out().await;
    ok(true)
}

async fn current_user_impl(session: &dyn SessionService) -> CommandResult<Option<AuthUser>> {
    ok(session.current_user().await)
}

fn update_settings_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    settings: Settings,
) -> CommandResult<Settings> {
    state.update_settings(settings.clone());
    persist(ctx, state);
    ok(settings)
}

#[cfg(all(feature = "app", not(test)))]
pub struct RemoteServices {
    pub remote: std::sync::Arc<dyn TaskRemote>,
    pub session: std::sync::Arc<dyn SessionService>,
}

#[cfg(all(feature = "app", not(test)))]
struct TauriCommandCtx<'a> {
    app: &'a AppHandle,
}

#[cfg(all(feature = "app", not(test)))]
impl CommandCtx for TauriCommandCtx<'_> {
    fn app_data_dir(&self) -> Result<PathBuf, StorageError> {
        self.app
            .path()
            .app_data_dir()
            .map_err(|err| StorageError::Io(std::io::Error::other(err.to_string())))
    }

    fn emit_state_updated(&self, payload: StatePayload) {
        let _ = self.app.emit(EVENT_STATE_UPDATED, payload);
    }
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn load_state(app: AppHandle, state: State<AppState>) -> CommandResult<StatePayload> {
    let ctx = TauriCommandCtx { app: &app };
    load_state_impl(&ctx, state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn visible_tasks(state: State<AppState>) -> CommandResult<Vec<Task>> {
    visible_tasks_impl(state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn open_editor(state: State<AppState>, task_id: String) -> CommandResult<EditorState> {
    open_editor_impl(state.inner(), &task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn new_task_editor(state: State<AppState>) -> CommandResult<EditorState> {
    new_task_editor_impl(state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn clear_editor(state: State<AppState>) -> CommandResult<EditorState> {
    clear_editor_impl(state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub async fn save_editor(
    app: AppHandle,
    state: State<'_, AppState>,
    services: State<'_, RemoteServices>,
    title: String,
    details_doc: String,
) -> Result<CommandResult<Option<Task>>, String> {
    let ctx = TauriCommandCtx { app: &app };
    Ok(save_editor_impl(
        &ctx,
        state.inner(),
        services.remote.as_ref(),
        &title,
        &details_doc,
    )
    .await)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub async fn delete_editor_task(
    app: AppHandle,
    state: State<'_, AppState>,
    services: State<'_, RemoteServices>,
) -> Result<CommandResult<bool>, String> {
    let ctx = TauriCommandCtx { app: &app };
    Ok(delete_editor_task_impl(&ctx, state.inner(), services.remote.as_ref()).await)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub async fn toggle_completion(
    app: AppHandle,
    state: State<'_, AppState>,
    services: State<'_, RemoteServices>,
    task_id: String,
) -> Result<CommandResult<bool>, String> {
    let ctx = TauriCommandCtx { app: &app };
    Ok(toggle_completion_impl(&ctx, state.inner(), services.remote.as_ref(), &task_id).await)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn open_search(state: State<AppState>) -> CommandResult<SearchOverlay> {
    open_search_impl(state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn close_search(state: State<AppState>) -> CommandResult<SearchOverlay> {
    close_search_impl(state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn set_search_query(state: State<AppState>, query: String) -> CommandResult<SearchOverlay> {
    set_search_query_impl(state.inner(), query)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub async fn sign_in(
    services: State<'_, RemoteServices>,
    email: String,
    password: String,
) -> Result<CommandResult<AuthUser>, String> {
    Ok(sign_in_impl(services.session.as_ref(), &email, &password).await)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub async fn sign_up(
    services: State<'_, RemoteServices>,
    full_name: String,
    email: String,
    password: String,
    confirm_password: String,
) -> Result<CommandResult<SignUpOutcome>, String> {
    Ok(sign_up_impl(
        services.session.as_ref(),
        &full_name,
        &email,
        &password,
        &confirm_password,
    )
    .await)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub async fn sign_out(
    services: State<'_, RemoteServices>,
) -> Result<CommandResult<bool>, String> {
    Ok(sign_out_impl(services.session.as_ref()).await)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub async fn current_user(
    services: State<'_, RemoteServices>,
) -> Result<CommandResult<Option<AuthUser>>, String> {
    Ok(current_user_impl(services.session.as_ref()).await)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn update_settings(
    app: AppHandle,
    state: State<AppState>,
    settings: Settings,
) -> CommandResult<Settings> {
    let ctx = TauriCommandCtx { app: &app };
    update_settings_impl(&ctx, state.inner(), settings)
}
