//! OpenStack-style metadata document
//!
//! Pure transformation from the guest identity, aggregated keys, and planned
//! injections to the `meta_data.json` structure. Optional sections are
//! omitted entirely when empty rather than serialized as empty containers.

use crate::inject::InjectRecord;
use crate::{ConfigDriveError, GuestIdentity};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Instance metadata as consumed by in-guest tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaData {
    /// Keys indexed by stringified position; consumers must not rely on the
    /// map's iteration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_keys: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileEntry>>,
    pub hostname: String,
    pub name: String,
    pub uuid: String,
}

/// One injected-file mapping in the metadata document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub content_path: String,
    pub path: String,
}

/// Build the metadata document for one run
pub fn build_metadata(
    guest: &GuestIdentity,
    ssh_keys: &[String],
    injections: &[InjectRecord],
) -> MetaData {
    let public_keys = if ssh_keys.is_empty() {
        None
    } else {
        Some(
            ssh_keys
                .iter()
                .enumerate()
                .map(|(i, key)| (i.to_string(), key.clone()))
                .collect(),
        )
    };

    let files = if injections.is_empty() {
        None
    } else {
        Some(
            injections
                .iter()
                .map(|record| FileEntry {
                    content_path: record.content_path.clone(),
                    path: record.guest_path.clone(),
                })
                .collect(),
        )
    };

    MetaData {
        public_keys,
        files,
        hostname: guest.hostname.clone(),
        name: guest.hostname.clone(),
        uuid: guest.uuid.to_string(),
    }
}

/// Serialize the document as indented JSON to a new temporary file.
///
/// Like the user-data file, it persists until the image has been mastered.
pub fn write_metadata(document: &MetaData) -> Result<PathBuf, ConfigDriveError> {
    let pretty = serde_json::to_string_pretty(document)?;
    debug!("Metadata document:\n{}", pretty);

    let mut file = tempfile::Builder::new()
        .prefix("configdrive-meta-data-")
        .suffix(".json")
        .tempfile()?;
    writeln!(file, "{}", pretty)?;

    let (_, path) = file.keep().map_err(|e| ConfigDriveError::Io(e.error))?;
    debug!("Wrote metadata to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::plan_injections;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn test_guest() -> GuestIdentity {
        GuestIdentity {
            hostname: "web01".to_string(),
            uuid: Uuid::nil(),
        }
    }

    #[test]
    fn test_empty_keys_omit_public_keys() {
        let document = build_metadata(&test_guest(), &[], &[]);
        assert!(document.public_keys.is_none());
        assert!(document.files.is_none());

        let value = serde_json::to_value(&document).unwrap();
        assert!(value.get("public_keys").is_none());
        assert!(value.get("files").is_none());
    }

    #[test]
    fn test_keys_are_indexed_in_order() {
        let keys = vec![
            "ssh-rsa AAA... key1".to_string(),
            "ssh-rsa AAA... key2".to_string(),
        ];
        let document = build_metadata(&test_guest(), &keys, &[]);

        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(
            value["public_keys"],
            json!({"0": "ssh-rsa AAA... key1", "1": "ssh-rsa AAA... key2"})
        );
    }

    #[test]
    fn test_identity_fields() {
        let document = build_metadata(&test_guest(), &[], &[]);
        assert_eq!(document.hostname, "web01");
        assert_eq!(document.name, "web01");
        assert_eq!(document.uuid, "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_files_mirror_injection_records() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("etc")).unwrap();
        fs::write(dir.path().join("etc/motd"), "hello").unwrap();
        fs::write(dir.path().join("issue"), "banner").unwrap();

        let injections = plan_injections(dir.path());
        let document = build_metadata(&test_guest(), &[], &injections);

        let files = document.files.unwrap();
        assert_eq!(files.len(), injections.len());
        for (entry, record) in files.iter().zip(&injections) {
            assert_eq!(entry.content_path, record.content_path);
            assert_eq!(entry.path, record.guest_path);
        }
    }

    #[test]
    fn test_write_metadata_round_trips() {
        let keys = vec!["ssh-rsa AAA key".to_string()];
        let document = build_metadata(&test_guest(), &keys, &[]);
        let path = write_metadata(&document).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["hostname"], "web01");
        assert_eq!(parsed["public_keys"]["0"], "ssh-rsa AAA key");
    }
}
