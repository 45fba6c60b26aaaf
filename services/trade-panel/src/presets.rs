//! Saved quick-select values (percentage and amount buttons)
//!
//! Presets live in a small key-value store. The file-backed store keeps one
//! JSON document per key in a directory.

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Store key for percentage presets
pub const PERCENTAGE_PRESETS_KEY: &str = "tradingPercentageValues";

/// Store key for amount presets
pub const AMOUNT_PRESETS_KEY: &str = "tradingAmountValues";

/// Default directory name under the home directory
const DEFAULT_PRESETS_DIR: &str = ".trade-panel";

#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("Preset storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preset data is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Preset index {index} out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Preset store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, PresetError>;

/// Local key-value store
pub trait PresetStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: &Value) -> Result<()>;
}

/// One `<key>.json` file per key
pub struct FilePresetStore {
    dir: PathBuf,
}

impl FilePresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        debug!("Preset store at {}", dir.display());
        Ok(Self { dir })
    }

    /// `~/.trade-panel`
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_PRESETS_DIR)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl PresetStore for FilePresetStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(self.path_for(key), json)?;
        debug!("Wrote preset {}", key);
        Ok(())
    }
}

/// Volatile store
#[derive(Default)]
pub struct MemoryPresetStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresetStore for MemoryPresetStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self
            .values
            .lock()
            .map_err(|e| PresetError::Unavailable(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| PresetError::Unavailable(e.to_string()))?;
        values.insert(key.to_string(), value.clone());
        Ok(())
    }
}

pub fn default_percentages() -> Vec<Decimal> {
    [25, 50, 75, 100].into_iter().map(Decimal::from).collect()
}

pub fn default_amounts() -> Vec<Decimal> {
    vec![
        Decimal::new(1, 1),
        Decimal::new(5, 1),
        Decimal::ONE,
        Decimal::TWO,
    ]
}

/// Current preset lists
#[derive(Debug, Clone, PartialEq)]
pub struct Presets {
    pub percentages: Vec<Decimal>,
    pub amounts: Vec<Decimal>,
}

impl Default for Presets {
    fn default() -> Self {
        Self {
            percentages: default_percentages(),
            amounts: default_amounts(),
        }
    }
}

impl Presets {
    /// Load both lists, falling back to defaults on missing or unreadable data
    pub fn load(store: &dyn PresetStore) -> Self {
        Self {
            percentages: load_list(store, PERCENTAGE_PRESETS_KEY, default_percentages),
            amounts: load_list(store, AMOUNT_PRESETS_KEY, default_amounts),
        }
    }

    /// Replace percentage preset `index` with the value in `text`
    ///
    /// Only `0 < v <= 100` is accepted; anything else leaves the list as it
    /// was and returns `Ok(false)`.
    pub fn edit_percentage(
        &mut self,
        store: &dyn PresetStore,
        index: usize,
        text: &str,
    ) -> Result<bool> {
        edit_list(
            &mut self.percentages,
            store,
            PERCENTAGE_PRESETS_KEY,
            index,
            text,
            |v| v > Decimal::ZERO && v <= Decimal::ONE_HUNDRED,
        )
    }

    /// Replace amount preset `index`; accepts any positive value
    pub fn edit_amount(
        &mut self,
        store: &dyn PresetStore,
        index: usize,
        text: &str,
    ) -> Result<bool> {
        edit_list(
            &mut self.amounts,
            store,
            AMOUNT_PRESETS_KEY,
            index,
            text,
            |v| v > Decimal::ZERO,
        )
    }

    pub fn percentage(&self, index: usize) -> Result<Decimal> {
        lookup(&self.percentages, index)
    }

    pub fn amount(&self, index: usize) -> Result<Decimal> {
        lookup(&self.amounts, index)
    }
}

fn lookup(list: &[Decimal], index: usize) -> Result<Decimal> {
    list.get(index).copied().ok_or(PresetError::IndexOutOfRange {
        index,
        len: list.len(),
    })
}

fn load_list(store: &dyn PresetStore, key: &str, default: fn() -> Vec<Decimal>) -> Vec<Decimal> {
    match store.get(key) {
        Ok(Some(value)) => match serde_json::from_value::<Vec<Decimal>>(value) {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => default(),
            Err(e) => {
                warn!("Ignoring malformed presets under {}: {}", key, e);
                default()
            }
        },
        Ok(None) => default(),
        Err(e) => {
            warn!("Failed to read presets {}: {}", key, e);
            default()
        }
    }
}

fn edit_list(
    list: &mut Vec<Decimal>,
    store: &dyn PresetStore,
    key: &str,
    index: usize,
    text: &str,
    accept: impl Fn(Decimal) -> bool,
) -> Result<bool> {
    if index >= list.len() {
        return Err(PresetError::IndexOutOfRange {
            index,
            len: list.len(),
        });
    }

    let value = match text.trim().parse::<Decimal>() {
        Ok(v) if accept(v) => v,
        _ => {
            debug!("Rejected preset value {:?} for {}", text, key);
            return Ok(false);
        }
    };

    let mut next = list.clone();
    next[index] = value;
    next.sort();
    store.set(key, &serde_json::to_value(&next)?)?;
    *list = next;
    Ok(true)
}
