//! Rendered cloud-config handling
//!
//! The rendered template is kept as a generic YAML value so arbitrary
//! cloud-config content passes through untouched. The aggregated SSH keys are
//! written back into the document before it is serialized, so the guest sees
//! them even if it never reads the metadata document.

use crate::keys::AUTHORIZED_KEYS_FIELD;
use crate::ConfigDriveError;
use serde_yaml::Value;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

/// First line of every written user-data document
pub const CLOUD_CONFIG_MARKER: &str = "#cloud-config";

/// Parse rendered template output as a cloud-config document.
///
/// Empty or unparseable output is tolerated and yields a null document; the
/// run continues with "no configuration" rather than aborting.
pub fn parse_cloud_config(rendered: &str) -> Value {
    match serde_yaml::from_str(rendered) {
        Ok(value) => value,
        Err(e) => {
            warn!("Rendered user data is not valid YAML, continuing without it: {}", e);
            Value::Null
        }
    }
}

/// Overwrite the document's authorized-keys field with the aggregated keys.
///
/// Skipped without error when the document is not a mapping (the template
/// rendered to null, a scalar, or a sequence).
pub fn rewrite_cloud_config(config: &mut Value, ssh_keys: &[String]) {
    let Some(mapping) = config.as_mapping_mut() else {
        debug!("Rendered configuration is not a mapping, skipping key rewrite");
        return;
    };

    let keys = Value::Sequence(
        ssh_keys
            .iter()
            .map(|k| Value::String(k.clone()))
            .collect(),
    );
    mapping.insert(Value::String(AUTHORIZED_KEYS_FIELD.to_string()), keys);
}

/// Serialize the document to a new temporary user-data file.
///
/// The file persists past this call; it is removed by the orchestrator only
/// after the image has been mastered successfully.
pub fn write_user_data(config: &Value) -> Result<PathBuf, ConfigDriveError> {
    let yaml = serde_yaml::to_string(config)?;

    let mut file = tempfile::Builder::new()
        .prefix("configdrive-user-data-")
        .tempfile()?;
    writeln!(file, "{}", CLOUD_CONFIG_MARKER)?;
    file.write_all(yaml.as_bytes())?;

    let (_, path) = file.keep().map_err(|e| ConfigDriveError::Io(e.error))?;
    debug!("Wrote user data to {}", path.display());
    Ok(path)
}
