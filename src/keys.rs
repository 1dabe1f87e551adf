//! SSH public key collection
//!
//! Keys come from two sources, in this order: a recursive scan of the key
//! directory (one or more keys per file, newline-delimited), then any
//! `ssh_authorized_keys` entries declared by the rendered cloud-config.
//! Duplicates are kept; both consumers tolerate them.

use serde_yaml::Value;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Cloud-config field holding declared keys
pub const AUTHORIZED_KEYS_FIELD: &str = "ssh_authorized_keys";

/// Collect SSH public keys from every regular file under `dir`.
///
/// Each non-empty trimmed line of each readable file becomes one key, in
/// sorted traversal order. Files that cannot be read (permissions, transient
/// I/O failure, non-regular entries) are skipped; collection is best-effort
/// and never fails the run. A missing directory yields no keys.
pub fn collect_ssh_keys(dir: &Path) -> Vec<String> {
    let mut keys = Vec::new();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        match read_key_lines(entry.path()) {
            Ok(lines) => keys.extend(lines),
            Err(reason) => {
                debug!("Skipping key file {}: {}", entry.path().display(), reason);
            }
        }
    }

    keys
}

/// Read one key file, returning its non-empty trimmed lines
fn read_key_lines(path: &Path) -> Result<Vec<String>, std::io::Error> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Append keys declared by the rendered cloud-config to `keys`.
///
/// The document may be absent (null) or not a mapping at all; both cases mean
/// "no additional keys" rather than an error. Non-string entries in the
/// declared sequence are ignored.
pub fn merge_config_keys(config: &Value, keys: &mut Vec<String>) {
    let Some(mapping) = config.as_mapping() else {
        return;
    };
    let Some(declared) = mapping.get(AUTHORIZED_KEYS_FIELD).and_then(Value::as_sequence) else {
        return;
    };

    for entry in declared {
        if let Some(key) = entry.as_str() {
            keys.push(key.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_one_key_per_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("alice.pub"), "ssh-rsa AAA... key1\n").unwrap();
        fs::write(dir.path().join("bob.pub"), "ssh-rsa AAA... key2\n").unwrap();

        let keys = collect_ssh_keys(dir.path());
        assert_eq!(keys, vec!["ssh-rsa AAA... key1", "ssh-rsa AAA... key2"]);
    }

    #[test]
    fn test_collect_recurses_and_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("team")).unwrap();
        fs::write(
            dir.path().join("team/keys"),
            "ssh-ed25519 AAA one\n\n  ssh-ed25519 AAA two  \n",
        )
        .unwrap();

        let keys = collect_ssh_keys(dir.path());
        assert_eq!(keys, vec!["ssh-ed25519 AAA one", "ssh-ed25519 AAA two"]);
    }

    #[test]
    fn test_collect_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let keys = collect_ssh_keys(&dir.path().join("does-not-exist"));
        assert!(keys.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_skips_unreadable_files() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let hidden = dir.path().join("hidden.pub");
        fs::write(&hidden, "ssh-rsa AAA hidden\n").unwrap();
        fs::set_permissions(&hidden, fs::Permissions::from_mode(0o000)).unwrap();
        fs::write(dir.path().join("visible.pub"), "ssh-rsa AAA visible\n").unwrap();

        // Root ignores file modes, so the skip path is unobservable there
        if fs::read_to_string(&hidden).is_ok() {
            return;
        }

        let keys = collect_ssh_keys(dir.path());
        assert_eq!(keys, vec!["ssh-rsa AAA visible"]);
    }

    #[test]
    fn test_merge_from_mapping() {
        let config: Value =
            serde_yaml::from_str("ssh_authorized_keys:\n  - declared-key\n").unwrap();
        let mut keys = vec!["scanned-key".to_string()];

        merge_config_keys(&config, &mut keys);
        assert_eq!(keys, vec!["scanned-key", "declared-key"]);
    }

    #[test]
    fn test_merge_tolerates_null_document() {
        let mut keys = vec!["scanned-key".to_string()];
        merge_config_keys(&Value::Null, &mut keys);
        assert_eq!(keys, vec!["scanned-key"]);
    }

    #[test]
    fn test_merge_tolerates_non_mapping_document() {
        let config = Value::String("just a scalar".to_string());
        let mut keys = Vec::new();
        merge_config_keys(&config, &mut keys);
        assert!(keys.is_empty());
    }

    #[test]
    fn test_merge_tolerates_wrong_shaped_field() {
        let config: Value = serde_yaml::from_str("ssh_authorized_keys: 42\n").unwrap();
        let mut keys = Vec::new();
        merge_config_keys(&config, &mut keys);
        assert!(keys.is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("key.pub"), "same-key\n").unwrap();

        let config: Value = serde_yaml::from_str("ssh_authorized_keys:\n  - same-key\n").unwrap();
        let mut keys = collect_ssh_keys(dir.path());
        merge_config_keys(&config, &mut keys);

        assert_eq!(keys, vec!["same-key", "same-key"]);
    }
}
