use log::{debug, info, warn};
use serde::Serialize;
use snafu::ResultExt;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::*;

/// The name of the backing file when none is given.
pub const DEFAULT_STORE_PATH: &str = "election_data.json";

/// Durable home of the whole store.
///
/// The state is always read and written in full. Implementations are
/// expected to keep the previously committed state intact if a save fails
/// half-way.
pub trait ElectionRepository {
    /// Returns the committed state, or creates and commits the initial state
    /// if nothing has been written yet.
    fn load(&mut self) -> ElectionResult<StoreState>;

    /// Replaces the committed state.
    fn save(&mut self, state: &StoreState) -> ElectionResult<()>;
}

/// A store kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> JsonFileStore {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    // Sibling of the target, so that the final rename stays on one filesystem.
    fn temp_path(&self) -> PathBuf {
        let mut name: OsString = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from(DEFAULT_STORE_PATH));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Encodes the state the way it is laid out on disk (4-space indentation).
pub fn encode_state(state: &StoreState) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf: Vec<u8> = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    state.serialize(&mut ser)?;
    Ok(buf)
}

pub fn decode_state(bytes: &[u8]) -> Result<StoreState, serde_json::Error> {
    serde_json::from_slice(bytes)
}

impl ElectionRepository for JsonFileStore {
    fn load(&mut self) -> ElectionResult<StoreState> {
        if !self.path.exists() {
            info!(
                "load: no store at {}, creating the initial store",
                self.path.display()
            );
            let state = StoreState::initial();
            self.save(&state)?;
            return Ok(state);
        }
        let contents = fs::read(&self.path).context(StorageFailureSnafu {
            path: self.path.clone(),
        })?;
        let state = decode_state(&contents).context(CorruptStoreSnafu {
            path: self.path.clone(),
        })?;
        if let Some(reason) = state.inconsistency() {
            warn!("load: {} rejected: {}", self.path.display(), reason);
            return InconsistentStoreSnafu {
                reason,
                path: self.path.clone(),
            }
            .fail();
        }
        debug!(
            "load: read {} elections from {}",
            state.elections.len(),
            self.path.display()
        );
        Ok(state)
    }

    fn save(&mut self, state: &StoreState) -> ElectionResult<()> {
        let bytes = encode_state(state).context(EncodingFailureSnafu {
            path: self.path.clone(),
        })?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context(StorageFailureSnafu {
                    path: parent.to_path_buf(),
                })?;
            }
        }

        let tmp = self.temp_path();
        {
            let mut file = File::create(&tmp).context(StorageFailureSnafu { path: tmp.clone() })?;
            file.write_all(&bytes)
                .context(StorageFailureSnafu { path: tmp.clone() })?;
            file.sync_all()
                .context(StorageFailureSnafu { path: tmp.clone() })?;
        }
        fs::rename(&tmp, &self.path).context(StorageFailureSnafu {
            path: self.path.clone(),
        })?;
        debug!("save: wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}

/// A store that lives in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    committed: Option<StoreState>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn with_state(state: StoreState) -> MemoryStore {
        MemoryStore {
            committed: Some(state),
            saves: 0,
        }
    }

    pub fn committed(&self) -> Option<&StoreState> {
        self.committed.as_ref()
    }

    /// How many times the state was saved.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl ElectionRepository for MemoryStore {
    fn load(&mut self) -> ElectionResult<StoreState> {
        match &self.committed {
            Some(state) => Ok(state.clone()),
            None => {
                let state = StoreState::initial();
                self.save(&state)?;
                Ok(state)
            }
        }
    }

    fn save(&mut self, state: &StoreState) -> ElectionResult<()> {
        self.committed = Some(state.clone());
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> StoreState {
        let js = r#"{
            "admins": [{"username": "admin", "password": "admin123"}],
            "elections": {
                "Zoning Board": {
                    "candidates": [
                        {"id": "CQ1", "name": "Rita", "party": "Red"},
                        {"id": "CA2", "name": "Omar", "party": "Orange"}
                    ],
                    "voters": {
                        "VZZ": {"name": "Zed", "age": 40, "voted": true},
                        "VAA": {"name": "Ann", "age": 19, "voted": false}
                    },
                    "votes": {"CQ1": 1, "CA2": 0},
                    "suggestions": [{"voter": "VZZ", "text": "Longer hours"}],
                    "results_published": false
                },
                "Library Fund": {
                    "candidates": [],
                    "voters": {},
                    "votes": {},
                    "suggestions": [],
                    "results_published": true
                }
            }
        }"#;
        decode_state(js.as_bytes()).unwrap()
    }

    #[test]
    fn decode_keeps_order() {
        let state = sample_state();
        let names: Vec<&str> = state.elections.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Zoning Board", "Library Fund"]);
        let e = &state.elections[0].1;
        let voter_ids: Vec<&str> = e.voters.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(voter_ids, vec!["VZZ", "VAA"]);
        assert_eq!(e.suggestions[0].voter_id, "VZZ");
    }

    #[test]
    fn encoding_is_a_fixed_point() {
        let state = sample_state();
        let bytes = encode_state(&state).unwrap();
        let again = decode_state(&bytes).unwrap();
        assert_eq!(again, state);
        assert_eq!(encode_state(&again).unwrap(), bytes);
    }

    #[test]
    fn encoding_uses_original_layout() {
        let bytes = encode_state(&StoreState::initial()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\n    \"admins\": ["));
        assert!(text.contains("\"elections\": {}"));
    }

    #[test]
    fn missing_fields_default() {
        let js = r#"{"admins": [], "elections": {"E": {"candidates": []}}}"#;
        let state = decode_state(js.as_bytes()).unwrap();
        let e = &state.elections[0].1;
        assert!(!e.results_published);
        assert!(e.voters.is_empty());
    }

    #[test]
    fn encoding_failures_are_not_reported_as_bad_files() {
        let source = serde_json::from_str::<u32>("x").unwrap_err();
        let err = ElectionError::EncodingFailure {
            source,
            path: PathBuf::from("election_data.json"),
        };
        assert!(err.is_fatal());
        assert!(!err.to_string().contains("not a valid election file"));
    }

    #[test]
    fn memory_store_initializes_once() {
        let mut store = MemoryStore::new();
        let state = store.load().unwrap();
        assert_eq!(state, StoreState::initial());
        assert_eq!(store.save_count(), 1);
        store.load().unwrap();
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn temp_path_is_a_sibling() {
        let store = JsonFileStore::new("/var/lib/votes/election_data.json");
        assert_eq!(
            store.temp_path(),
            PathBuf::from("/var/lib/votes/election_data.json.tmp")
        );
    }
}
