//! Light/dark theme preference.
//!
//! The [`ThemeController`] owns the display state and persists the user's
//! choice through a [`PreferenceStore`].  A store that cannot be read or
//! written only costs persistence: the display state still flips.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::chat::events::{Key, KeyResponse};
use crate::error::{Error, Result};
use crate::observability::{THEME_STORE_ERRORS, THEME_TOGGLES};

/// Storage key under which the theme preference is persisted.
pub const THEME_KEY: &str = "theme";

/// Display theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    /// The default.
    #[default]
    Dark,
    /// Opt-in light mode.
    Light,
}

impl Theme {
    /// Returns the persisted name of the theme.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Returns the other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Accessible label for the toggle control: the action it performs next.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Theme::Dark => "Switch to light theme",
            Theme::Light => "Switch to dark theme",
        }
    }

    /// Interprets a stored preference.  Only `"light"` selects light mode.
    pub fn from_preference(value: Option<&str>) -> Self {
        match value {
            Some("light") => Theme::Light,
            _ => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable key/value storage for client preferences.
pub trait PreferenceStore: Send + Sync {
    /// Reads the value stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn store(&self, key: &str, value: &str) -> Result<()>;
}

/// A process-lifetime store, used when no durable store is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept as a JSON object in a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Uses the file at `path`.  The file and its parent are created on the
    /// first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The per-user default location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("course-chat").join("preferences.json"))
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                Error::storage(format!(
                    "failed to parse preferences in {}: {err}",
                    self.path.display()
                ))
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(Error::storage(format!(
                "failed to read {}: {err}",
                self.path.display()
            ))),
        }
    }
}

impl PreferenceStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        // An unreadable file is replaced rather than blocking every write.
        let mut values = self.read_all().unwrap_or_default();
        values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| {
                Error::storage(format!("failed to create {}: {err}", parent.display()))
            })?;
        }
        let contents = serde_json::to_string_pretty(&values)?;
        fs::write(&self.path, contents).map_err(|err| {
            Error::storage(format!("failed to write {}: {err}", self.path.display()))
        })
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Box<T> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        (**self).store(key, value)
    }
}

/// Owns the display theme and its persisted preference.
pub struct ThemeController<S: PreferenceStore> {
    store: S,
    theme: Mutex<Theme>,
}

impl<S: PreferenceStore> ThemeController<S> {
    /// Creates a controller in the default (dark) state.
    pub fn new(store: S) -> Self {
        Self {
            store,
            theme: Mutex::new(Theme::default()),
        }
    }

    /// Applies the persisted preference.
    ///
    /// A stored `"light"` selects light mode; anything else, including a
    /// missing or unreadable preference, leaves the default dark mode.
    pub fn initialize_theme(&self) -> Theme {
        let stored = match self.store.load(THEME_KEY) {
            Ok(stored) => stored,
            Err(err) => {
                THEME_STORE_ERRORS.click();
                tracing::debug!(error = %err, "theme preference unavailable");
                None
            }
        };
        let theme = Theme::from_preference(stored.as_deref());
        *self.state() = theme;
        theme
    }

    /// Flips the theme and persists the new choice.  Returns the new theme.
    pub fn toggle_theme(&self) -> Theme {
        THEME_TOGGLES.click();
        let theme = {
            let mut state = self.state();
            *state = state.toggled();
            *state
        };
        if let Err(err) = self.store.store(THEME_KEY, theme.as_str()) {
            THEME_STORE_ERRORS.click();
            tracing::warn!(error = %err, "theme preference not persisted");
        }
        theme
    }

    /// Keyboard activation of the toggle control.
    ///
    /// Enter and Space both toggle.  Space also asks the host to suppress its
    /// default scrolling.
    pub fn handle_key(&self, key: Key) -> KeyResponse {
        let response = KeyResponse::for_toggle(key);
        if response.handled {
            self.toggle_theme();
        }
        response
    }

    /// The current display theme.
    pub fn current(&self) -> Theme {
        *self.state()
    }

    /// The toggle control's accessible label for the current theme.
    pub fn toggle_label(&self) -> &'static str {
        self.current().toggle_label()
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn state(&self) -> MutexGuard<'_, Theme> {
        self.theme.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
