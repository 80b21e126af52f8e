//! Process-wide runtime parameters.
//!
//! One store per process, shared by all queries. Each query takes a snapshot
//! when its [`ExecutionContext`](crate::ExecutionContext) is created, so a
//! parameter change never affects an evaluation that is already running.

use parking_lot::{const_rwlock, RwLock};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const USE_MATRIX_TRANSITIVE_PATH: &str = "use-matrix-transitive-path";
pub const USE_BINSEARCH_TRANSITIVE_PATH: &str = "use-binsearch-transitive-path";

/// Runtime parameters consulted by the transitive-path operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuntimeParameters {
    /// Matrix strategy when true, per-start-node graph search when false.
    pub use_matrix_transitive_path: bool,
    /// Sorted (binary search) adjacency view when true, hashed when false.
    pub use_binsearch_transitive_path: bool,
}

impl RuntimeParameters {
    pub const DEFAULT: RuntimeParameters = RuntimeParameters {
        use_matrix_transitive_path: true,
        use_binsearch_transitive_path: true,
    };

    /// Snapshot of the process-wide store.
    pub fn current() -> RuntimeParameters {
        *PARAMETERS.read()
    }

    /// Replace the process-wide store.
    pub fn install(params: RuntimeParameters) {
        *PARAMETERS.write() = params;
    }

    /// Parse a JSON object of kebab-case parameter names. Missing names keep
    /// their defaults; unknown names are rejected.
    pub fn from_json(json: &str) -> Result<RuntimeParameters> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set one parameter of this value by name.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let slot = match name {
            USE_MATRIX_TRANSITIVE_PATH => &mut self.use_matrix_transitive_path,
            USE_BINSEARCH_TRANSITIVE_PATH => &mut self.use_binsearch_transitive_path,
            other => return Err(Error::UnknownParameter(other.to_string())),
        };
        *slot = parse_bool(name, value)?;
        Ok(())
    }

    /// Read one parameter by name, rendered as a string.
    pub fn get(&self, name: &str) -> Result<String> {
        match name {
            USE_MATRIX_TRANSITIVE_PATH => Ok(self.use_matrix_transitive_path.to_string()),
            USE_BINSEARCH_TRANSITIVE_PATH => Ok(self.use_binsearch_transitive_path.to_string()),
            other => Err(Error::UnknownParameter(other.to_string())),
        }
    }
}

impl Default for RuntimeParameters {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static PARAMETERS: RwLock<RuntimeParameters> = const_rwlock(RuntimeParameters::DEFAULT);

/// Set a parameter in the process-wide store by name.
pub fn set_parameter(name: &str, value: &str) -> Result<()> {
    let mut params = PARAMETERS.write();
    let mut updated = *params;
    updated.set(name, value)?;
    *params = updated;
    tracing::info!(parameter = name, value, "runtime parameter updated");
    Ok(())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        _ => Err(Error::InvalidParameterValue {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
