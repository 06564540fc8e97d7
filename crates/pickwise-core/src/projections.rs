// Projection data loading and the live player catalog.
//
// Each provider ships a CSV with one row per player: a PLAYER column, a
// Position column, and any number of numeric projection columns. Rows from
// all providers are concatenated, in configured order, into one Catalog.

use crate::config::{Config, DataSource};
use crate::draft::slot::Slot;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Canonical matching key for a player name: trimmed and lower-cased.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One projection row for one player from one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Display name as it appears in the source file (trimmed).
    pub name: String,
    /// Matching key, computed once at load time.
    pub key: String,
    /// Position string as reported by the provider.
    pub position: String,
    /// Roster slot the position maps to, if recognized.
    pub slot: Option<Slot>,
    /// Numeric projection columns, keyed by header.
    pub stats: BTreeMap<String, f64>,
    /// Name of the provider this row came from.
    pub source: String,
}

impl PlayerRecord {
    pub fn new(name: &str, position: &str, source: &str) -> Self {
        let name = name.trim().to_string();
        let position = position.trim().to_string();
        PlayerRecord {
            key: name_key(&name),
            slot: Slot::from_str_pos(&position),
            name,
            position,
            stats: BTreeMap::new(),
            source: source.to_string(),
        }
    }

    pub fn with_stat(mut self, metric: &str, value: f64) -> Self {
        self.stats.insert(metric.to_string(), value);
        self
    }
}

/// The live set of undrafted players, in provider order.
///
/// Only ever shrinks: records leave through [`Catalog::remove_by_name`].
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<PlayerRecord>,
}

impl Catalog {
    pub fn new(records: Vec<PlayerRecord>) -> Self {
        Catalog { records }
    }

    /// Concatenate per-provider sequences in the order given.
    pub fn from_sources(sources: Vec<Vec<PlayerRecord>>) -> Self {
        Catalog {
            records: sources.into_iter().flatten().collect(),
        }
    }

    /// Remove every record (from every provider) matching `name`.
    /// Returns the number of records removed.
    pub fn remove_by_name(&mut self, name: &str) -> usize {
        let key = name_key(name);
        let before = self.records.len();
        self.records.retain(|r| r.key != key);
        before - self.records.len()
    }

    /// First record matching `name` (case-insensitive exact match).
    pub fn find(&self, name: &str) -> Option<&PlayerRecord> {
        let key = name_key(name);
        self.records.iter().find(|r| r.key == key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde struct (private)
// ---------------------------------------------------------------------------

/// Provider CSV row. Every column other than the name and position is
/// captured by `extra`; the ones that parse as numbers become stats.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawProjection {
    #[serde(alias = "Player", alias = "Name")]
    PLAYER: String,
    #[serde(alias = "POS", alias = "Pos")]
    Position: String,
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Reader-based loader (private, enables testing without temp files)
// ---------------------------------------------------------------------------

fn load_source_from_reader<R: Read>(
    rdr: R,
    source: &str,
) -> Result<Vec<PlayerRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut records = Vec::new();
    for result in reader.deserialize::<RawProjection>() {
        match result {
            Ok(raw) => {
                if raw.PLAYER.trim().is_empty() {
                    warn!("skipping {} row with empty player name", source);
                    continue;
                }
                let mut record = PlayerRecord::new(&raw.PLAYER, &raw.Position, source);
                for (metric, value) in raw.extra {
                    if let Some(v) = stat_value(&value) {
                        record.stats.insert(metric.trim().to_string(), v);
                    }
                }
                records.push(record);
            }
            Err(e) => {
                warn!("skipping malformed {} row: {}", source, e);
            }
        }
    }
    Ok(records)
}

/// Numeric value of a CSV cell, if it has one. Cells the CSV reader left as
/// strings (e.g. "12.5" with odd quoting) get a second parse attempt.
fn stat_value(value: &serde_json::Value) -> Option<f64> {
    let v = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load one provider's projections from a CSV file.
pub fn load_source(path: &Path, source: &str) -> Result<Vec<PlayerRecord>, ProjectionError> {
    let file = std::fs::File::open(path).map_err(|e| ProjectionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_source_from_reader(file, source).map_err(|e| ProjectionError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load every configured source and return the combined catalog.
pub fn load_all(config: &Config) -> Result<Catalog, ProjectionError> {
    load_all_from_sources(&config.data_sources)
}

/// Load and concatenate the given sources. Exposed for testing and flexibility.
///
/// Relative paths are resolved against the current working directory.
pub fn load_all_from_sources(sources: &[DataSource]) -> Result<Catalog, ProjectionError> {
    let mut per_source = Vec::with_capacity(sources.len());
    for source in sources {
        let records = load_source(Path::new(&source.path), &source.name)?;
        if records.is_empty() {
            warn!("projection source '{}' produced zero valid rows", source.name);
        } else {
            info!("loaded {} rows from '{}'", records.len(), source.name);
        }
        per_source.push(records);
    }

    let catalog = Catalog::from_sources(per_source);
    if catalog.is_empty() {
        return Err(ProjectionError::Validation(
            "projection sources produced zero valid rows".into(),
        ));
    }
    Ok(catalog)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
