// Learn more about Tauri commands at https://tauri.app/develop/calling-rust/
mod commands;
mod editor;
mod events;
mod list;
mod logging;
mod models;
mod remote;
mod session;
mod state;
mod storage;

#[cfg(all(feature = "app", not(test)))]
use std::sync::Arc;

#[cfg(all(feature = "app", not(test)))]
use tauri::Manager;

#[cfg(all(feature = "app", not(test)))]
use crate::commands::*;
#[cfg(all(feature = "app", not(test)))]
use crate::remote::{HttpTaskRemote, TaskRemote};
#[cfg(all(feature = "app", not(test)))]
use crate::session::{HttpSessionService, SessionService};
#[cfg(all(feature = "app", not(test)))]
use crate::state::AppState;
#[cfg(all(feature = "app", not(test)))]
use crate::storage::Storage;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
#[cfg(all(feature = "app", not(test)))]
pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            let data_dir = app.path().app_data_dir()?;
            if let Err(error) = logging::init_logging(&data_dir) {
                eprintln!("failed to initialize logging: {error}");
            }

            let storage = Storage::new(data_dir);
            storage.ensure_dirs()?;

            // A missing or corrupted mirror degrades to an empty session.
            let tasks = storage
                .load_tasks()
                .map(|data| data.tasks)
                .unwrap_or_default();
            let settings = storage
                .load_settings()
                .map(|data| data.settings)
                .unwrap_or_default();

            let session: Arc<dyn SessionService> = Arc::new(HttpSessionService::new(
                &settings.service_url,
                &settings.service_anon_key,
            )?);
            let remote: Arc<dyn TaskRemote> = Arc::new(HttpTaskRemote::new(
                &settings.service_url,
                &settings.service_anon_key,
                Arc::clone(&session),
            )?);

            app.manage(AppState::new(tasks, settings));
            app.manage(RemoteServices { remote, session });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            load_state,
            visible_tasks,
            open_editor,
            new_task_editor,
            clear_editor,
            save_editor,
            delete_editor_task,
            toggle_completion,
            open_search,
            close_search,
            set_search_query,
            sign_in,
            sign_up,
            sign_out,
            current_user,
            update_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
