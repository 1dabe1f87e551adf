//! File injection planning
//!
//! Each file under the injection root is assigned a zero-padded sequence
//! index in traversal order. The index ties the file's content path inside
//! the metadata namespace to its graft path inside the produced image, so the
//! record sequence must stay identical between planning and image assembly.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// One file to be injected into the config drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectRecord {
    /// Source path on the local filesystem
    pub local: PathBuf,
    /// Absolute path the file should occupy inside the guest
    pub guest_path: String,
    /// Path inside the metadata content namespace, e.g. `/content/0000`
    pub content_path: String,
    /// Path inside the image layout, e.g. `openstack/content/0000`
    pub graft_path: String,
}

/// Plan injections for every regular file under `root`.
///
/// Files are enumerated in sorted traversal order and numbered from 0000.
/// The guest path is the file's path relative to `root`, re-rooted at `/`;
/// a file directly at the root becomes `/<filename>`. A missing root yields
/// an empty plan.
pub fn plan_injections(root: &Path) -> Vec<InjectRecord> {
    let mut records = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };

        let seq = format!("{:04}", records.len());
        let record = InjectRecord {
            local: entry.path().to_path_buf(),
            guest_path: format!("/{}", relative.display()),
            content_path: format!("/content/{}", seq),
            graft_path: format!("openstack/content/{}", seq),
        };
        debug!("Planned injection {:?}", record);
        records.push(record);
    }

    records
}
