use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod compose;
pub mod list;
pub mod store;

pub use compose::{
    ComposeContext, ComposeField, ComposeForm, ComposeMode, format_body, format_subject,
};
pub use list::{ListCommand, ListKey, ListMode, ListModel, ListOutcome, ListView, PAGE_SIZE, Searchable};
pub use store::{
    ConfigDocument, Contact, ContactFields, Draft, DraftFields, LocalStore, SettingField,
};

static LOG_FILE: OnceLock<Mutex<Option<std::fs::File>>> = OnceLock::new();

pub fn xdg_config_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

pub fn xdg_state_dir() -> PathBuf {
    std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
        })
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Appends a line to the debug log when `HYPERMAIL_LOG` is set.
///
/// The terminal is owned by the UI, so nothing is ever printed.
pub fn log_debug(msg: &str) {
    if std::env::var("HYPERMAIL_LOG").is_err() {
        return;
    }
    let path = xdg_state_dir().join("hypermail").join("hypermail.log");
    let lock = LOG_FILE.get_or_init(|| {
        let _ = std::fs::create_dir_all(
            path.parent()
                .unwrap_or_else(|| std::path::Path::new("/tmp")),
        );
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok();
        Mutex::new(file)
    });
    if let Ok(mut guard) = lock.lock() {
        if let Some(file) = guard.as_mut() {
            let ts = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            let _ = writeln!(file, "[{}] {}", ts, msg);
        }
    }
}
