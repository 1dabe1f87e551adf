//! ISO image mastering
//!
//! Thin wrapper around `mkisofs`, invoked exactly once per run with one
//! graft-point argument (`imagepath=localpath`) per logical file. A non-zero
//! exit status is fatal for the whole run; no partial image is valid.

use crate::inject::InjectRecord;
use crate::ConfigDriveError;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// External ISO-mastering utility
const ISO_TOOL: &str = "mkisofs";

/// Well-known image path of the metadata document
pub const META_DATA_IMAGE_PATH: &str = "openstack/latest/meta_data.json";

/// Well-known image path of the user-data document
pub const USER_DATA_IMAGE_PATH: &str = "openstack/latest/user_data";

/// Build the graft-point arguments for one run.
///
/// Order matters: metadata first, user data second, then one graft per
/// injection record in planning order, so the image layout matches the
/// content paths recorded in the metadata document.
pub fn graft_args(
    meta_data: &Path,
    user_data: &Path,
    injections: &[InjectRecord],
) -> Vec<String> {
    let mut grafts = vec![
        format!("{}={}", META_DATA_IMAGE_PATH, meta_data.display()),
        format!("{}={}", USER_DATA_IMAGE_PATH, user_data.display()),
    ];
    for record in injections {
        grafts.push(format!("{}={}", record.graft_path, record.local.display()));
    }
    grafts
}

/// Master the config drive image at `output`.
///
/// Produces an ISO-9660 image with Joliet and Rock Ridge extensions. The
/// temporary documents are left in place on failure so a failed run can be
/// inspected.
pub fn assemble_image(
    output: &Path,
    meta_data: &Path,
    user_data: &Path,
    injections: &[InjectRecord],
) -> Result<(), ConfigDriveError> {
    let grafts = graft_args(meta_data, user_data, injections);

    let mut cmd = Command::new(ISO_TOOL);
    cmd.args(["-J", "-r", "-R", "-o"])
        .arg(output)
        .arg("-graft-points")
        .args(&grafts);
    debug!("Running {:?}", cmd);

    let status = cmd
        .status()
        .map_err(|e| ConfigDriveError::Command(format!("failed to run {}: {}", ISO_TOOL, e)))?;

    if !status.success() {
        return Err(ConfigDriveError::Command(format!(
            "{} exited with {}",
            ISO_TOOL, status
        )));
    }

    info!("Mastered config drive image at {}", output.display());
    Ok(())
}
