//! User preferences
//!
//! [`Preferences`] gives typed access to the values the user can change at
//! runtime. It is constructed once at startup over a [`PreferenceStore`]
//! backend and passed to whatever needs it.
//!
//! Interval values are stored as text and parsed on read, so a stored value
//! that is not a number surfaces as [`Error::InvalidPreference`].

use crate::columns;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Interval between samples, in milliseconds.
pub const PREF_UPDATE_INTERVAL: &str = "update_interval";
pub const PREF_UPDATE_INTERVAL_DEFAULT: &str = "10000";
/// Interval between forced device wake-ups, in milliseconds. 0 disables.
pub const PREF_WAKE_INTERVAL: &str = "wake_interval";
pub const PREF_WAKE_INTERVAL_DEFAULT: &str = "0";
pub const PREF_SERVICE_ENABLED: &str = "service_enabled";
pub const PREF_SERVICE_ENABLED_DEFAULT: bool = false;
pub const PREF_KML_EXPORT_COLUMN: &str = "kml_export_column";
pub const PREF_SELECTED_COLUMNS: &str = "selected_columns";
pub const PREF_SCHEDULER: &str = "scheduler";
pub const PREF_SCHEDULER_DEFAULT: &str = SchedulerKind::SYSTEM_ALARM;

/// Every preference key, for listing.
pub const KEYS: &[&str] = &[
    PREF_UPDATE_INTERVAL,
    PREF_WAKE_INTERVAL,
    PREF_SERVICE_ENABLED,
    PREF_KML_EXPORT_COLUMN,
    PREF_SELECTED_COLUMNS,
    PREF_SCHEDULER,
];

/// A stored preference value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefValue {
    Bool(bool),
    Text(String),
}

impl std::fmt::Display for PrefValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefValue::Bool(b) => write!(f, "{}", b),
            PrefValue::Text(s) => f.write_str(s),
        }
    }
}

/// Key-value backend for [`Preferences`].
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<PrefValue>;

    /// Store a value. Implementations persist before returning.
    fn put(&mut self, key: &str, value: PrefValue) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Store that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, PrefValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: PrefValue) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Store persisted as a flat TOML table, rewritten on every change.
#[derive(Debug)]
pub struct TomlFileStore {
    path: PathBuf,
    table: toml::Table,
}

impl TomlFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let table = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<toml::Table>(&content).map_err(|e| {
                Error::Config(format!("failed to parse preferences {:?}: {}", path, e))
            })?
        } else {
            toml::Table::new()
        };

        tracing::debug!(path = %path.display(), entries = table.len(), "Opened preferences");
        Ok(Self {
            path: path.to_path_buf(),
            table,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(&self.table)
            .map_err(|e| Error::Config(format!("failed to serialize preferences: {}", e)))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for TomlFileStore {
    fn get(&self, key: &str) -> Option<PrefValue> {
        match self.table.get(key)? {
            toml::Value::Boolean(b) => Some(PrefValue::Bool(*b)),
            toml::Value::String(s) => Some(PrefValue::Text(s.clone())),
            // Hand-edited numbers are read back as their text form.
            other => Some(PrefValue::Text(other.to_string())),
        }
    }

    fn put(&mut self, key: &str, value: PrefValue) -> Result<()> {
        let value = match value {
            PrefValue::Bool(b) => toml::Value::Boolean(b),
            PrefValue::Text(s) => toml::Value::String(s),
        };
        self.table.insert(key.to_string(), value);
        self.commit()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.table.remove(key).is_some() {
            self.commit()?;
        }
        Ok(())
    }
}

/// Strategy used to schedule sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    /// Timer loop inside the monitoring process
    InProcess,
    /// System alarm that wakes the process for each sample
    SystemAlarm,
}

impl SchedulerKind {
    pub const IN_PROCESS: &'static str = "in_process";
    pub const SYSTEM_ALARM: &'static str = "system_alarm";

    /// Stored name of this strategy.
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerKind::InProcess => Self::IN_PROCESS,
            SchedulerKind::SystemAlarm => Self::SYSTEM_ALARM,
        }
    }

    /// Strategy for a stored name; anything unrecognized selects the system alarm.
    pub fn from_name(name: &str) -> Self {
        if name == Self::IN_PROCESS {
            SchedulerKind::InProcess
        } else {
            SchedulerKind::SystemAlarm
        }
    }
}

/// Typed access to the user's preferences.
pub struct Preferences<S: PreferenceStore> {
    store: S,
}

impl<S: PreferenceStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Interval between samples, in milliseconds.
    pub fn update_interval(&self) -> Result<u32> {
        self.int_preference(PREF_UPDATE_INTERVAL, PREF_UPDATE_INTERVAL_DEFAULT)
    }

    pub fn set_update_interval(&mut self, millis: u32) -> Result<()> {
        self.store
            .put(PREF_UPDATE_INTERVAL, PrefValue::Text(millis.to_string()))
    }

    /// Interval between forced wake-ups, in milliseconds.
    pub fn wake_interval(&self) -> Result<u32> {
        self.int_preference(PREF_WAKE_INTERVAL, PREF_WAKE_INTERVAL_DEFAULT)
    }

    pub fn set_wake_interval(&mut self, millis: u32) -> Result<()> {
        self.store
            .put(PREF_WAKE_INTERVAL, PrefValue::Text(millis.to_string()))
    }

    pub fn is_service_enabled(&self) -> Result<bool> {
        match self.store.get(PREF_SERVICE_ENABLED) {
            None => Ok(PREF_SERVICE_ENABLED_DEFAULT),
            Some(PrefValue::Bool(b)) => Ok(b),
            Some(PrefValue::Text(s)) => s.trim().parse().map_err(|_| Error::InvalidPreference {
                key: PREF_SERVICE_ENABLED.to_string(),
                value: s,
            }),
        }
    }

    pub fn set_service_enabled(&mut self, value: bool) -> Result<()> {
        self.store.put(PREF_SERVICE_ENABLED, PrefValue::Bool(value))
    }

    /// Column that names KML placemarks.
    pub fn kml_export_column(&self) -> String {
        self.string_preference(PREF_KML_EXPORT_COLUMN)
            .unwrap_or_else(|| columns::SOCKET_CONNECTION_TEST.to_string())
    }

    pub fn set_kml_export_column(&mut self, column: &str) -> Result<()> {
        let column = columns::choose_one(column)?;
        self.store
            .put(PREF_KML_EXPORT_COLUMN, PrefValue::Text(column))
    }

    /// Scheduling strategy.
    pub fn scheduler(&self) -> SchedulerKind {
        let name = self
            .string_preference(PREF_SCHEDULER)
            .unwrap_or_else(|| PREF_SCHEDULER_DEFAULT.to_string());
        SchedulerKind::from_name(&name)
    }

    pub fn set_scheduler(&mut self, kind: SchedulerKind) -> Result<()> {
        self.store
            .put(PREF_SCHEDULER, PrefValue::Text(kind.name().to_string()))
    }

    /// Columns the user chose to see, or every known column when none are stored.
    pub fn selected_columns(&self) -> Vec<String> {
        match self.string_preference(PREF_SELECTED_COLUMNS) {
            Some(s) if !s.is_empty() => s.split(',').map(String::from).collect(),
            _ => columns::column_names(),
        }
    }

    pub fn set_selected_columns<T: AsRef<str>>(&mut self, selected: &[T]) -> Result<()> {
        let joined = selected
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        self.store
            .put(PREF_SELECTED_COLUMNS, PrefValue::Text(joined))
    }

    /// Effective value of `key` as text: the stored value read through its
    /// typed getter, or the default when nothing is stored.
    pub fn display_value(&self, key: &str) -> Result<String> {
        Ok(match key {
            PREF_UPDATE_INTERVAL => self.update_interval()?.to_string(),
            PREF_WAKE_INTERVAL => self.wake_interval()?.to_string(),
            PREF_SERVICE_ENABLED => self.is_service_enabled()?.to_string(),
            PREF_KML_EXPORT_COLUMN => self.kml_export_column(),
            PREF_SELECTED_COLUMNS => self.selected_columns().join(","),
            PREF_SCHEDULER => self.scheduler().name().to_string(),
            other => return Err(Error::Config(format!("unknown preference: {}", other))),
        })
    }

    /// Set `key` from user-typed text, validating it for that key.
    pub fn set_from_text(&mut self, key: &str, text: &str) -> Result<()> {
        let invalid = || Error::InvalidPreference {
            key: key.to_string(),
            value: text.to_string(),
        };
        match key {
            PREF_UPDATE_INTERVAL => self.set_update_interval(text.trim().parse().map_err(|_| invalid())?),
            PREF_WAKE_INTERVAL => self.set_wake_interval(text.trim().parse().map_err(|_| invalid())?),
            PREF_SERVICE_ENABLED => {
                self.set_service_enabled(text.trim().parse().map_err(|_| invalid())?)
            }
            PREF_KML_EXPORT_COLUMN => self.set_kml_export_column(text),
            PREF_SELECTED_COLUMNS => {
                let chosen = columns::choose_many(text.split(','))?;
                self.set_selected_columns(chosen.as_slice())
            }
            PREF_SCHEDULER => match text.trim() {
                SchedulerKind::IN_PROCESS => self.set_scheduler(SchedulerKind::InProcess),
                SchedulerKind::SYSTEM_ALARM => self.set_scheduler(SchedulerKind::SystemAlarm),
                _ => Err(invalid()),
            },
            other => Err(Error::Config(format!("unknown preference: {}", other))),
        }
    }

    /// Forget the stored value of `key` so its default applies again.
    ///
    /// This also recovers from a stored value that no longer parses.
    pub fn reset(&mut self, key: &str) -> Result<()> {
        if !KEYS.contains(&key) {
            return Err(Error::Config(format!("unknown preference: {}", key)));
        }
        self.store.remove(key)
    }

    fn string_preference(&self, key: &str) -> Option<String> {
        self.store.get(key).map(|v| v.to_string())
    }

    fn int_preference(&self, key: &str, default: &str) -> Result<u32> {
        let value = self
            .string_preference(key)
            .unwrap_or_else(|| default.to_string());
        value.trim().parse().map_err(|_| Error::InvalidPreference {
            key: key.to_string(),
            value,
        })
    }
}
