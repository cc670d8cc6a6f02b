//! Parameter store backed by a TOML file, or by memory only.
//!
//! `set` stages a value; `commit` persists all staged values with an atomic
//! file replace. Commits without staged changes do not touch the disk.

use std::path::{Path, PathBuf};

use rinest_config::PersistedParams;
use rinest_traits::{BoxError, ParamStore};

use crate::error::{Result, TelemetryError};

#[derive(Debug, Default)]
pub struct FileParamStore {
    path: Option<PathBuf>,
    params: PersistedParams,
    dirty: bool,
}

impl FileParamStore {
    /// Open (or start) the parameter file at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let params = rinest_config::load_params_file(&path)
            .map_err(|e| TelemetryError::Store(format!("{e:#}")))?;
        let keys = params.params.len();
        tracing::debug!(path = %path.display(), keys, "parameter file opened");
        Ok(Self {
            path: Some(path),
            params,
            dirty: false,
        })
    }

    /// Store that never touches the disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn snapshot(&self) -> &PersistedParams {
        &self.params
    }
}

impl ParamStore for FileParamStore {
    fn get(&self, key: &str) -> Option<f64> {
        self.params.params.get(key).copied()
    }

    fn set(&mut self, key: &str, value: f64) -> std::result::Result<(), BoxError> {
        if !value.is_finite() {
            return Err(Box::new(TelemetryError::Store(format!(
                "refusing non-finite value for {key}"
            ))));
        }
        self.params.params.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }

    fn commit(&mut self) -> std::result::Result<(), BoxError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = &self.path {
            rinest_config::save_params_file(path, &self.params)
                .map_err(|e| TelemetryError::Store(format!("{e:#}")))?;
            tracing::debug!(path = %path.display(), "parameter file written");
        }
        self.dirty = false;
        Ok(())
    }
}
