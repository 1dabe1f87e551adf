//! configdrive library
//!
//! Assembles an OpenStack-style config drive ISO image: renders a user-data
//! template, gathers SSH public keys, plans file injections, writes a
//! `meta_data.json` document, and masters everything into a single image a
//! cloud-init-compatible guest can consume at first boot.
//!
//! # Design Principles
//!
//! - **Safety First**: No unsafe code (`#![forbid(unsafe_code)]`)
//! - **Linear Pipeline**: each phase is a pure function over immutable value
//!   records; the orchestrator threads results forward with no shared state
//! - **Best Effort Inputs**: unreadable key files and wrong-shaped rendered
//!   configuration never abort a run; only template and image-mastering
//!   failures are fatal

pub mod image;
pub mod inject;
pub mod keys;
pub mod metadata;
pub mod template;
pub mod userdata;

mod error;

pub use error::ConfigDriveError;

use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};
use uuid::Uuid;

/// Identity of the guest the config drive is built for.
///
/// Created once at startup and immutable for the rest of the run.
#[derive(Debug, Clone)]
pub struct GuestIdentity {
    pub hostname: String,
    pub uuid: Uuid,
}

impl GuestIdentity {
    /// Create an identity with a freshly generated UUID
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            uuid: Uuid::new_v4(),
        }
    }
}

/// Everything needed to assemble one config drive
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub guest: GuestIdentity,
    pub inject_directory: PathBuf,
    pub ssh_key_directory: PathBuf,
    pub user_data_template: PathBuf,
    pub output_iso: PathBuf,
}

/// Assemble the config drive image described by `request`.
///
/// The run is a strict linear sequence: render the user-data template,
/// collect SSH keys, plan file injections, rewrite the rendered configuration
/// with the aggregated keys, build the metadata document, and invoke the ISO
/// mastering tool. There are no retries; the first fatal error aborts the
/// run. The two temporary documents are deleted only after the image has been
/// mastered successfully, so a failed run leaves them behind for inspection.
///
/// Returns the path of the produced image.
pub fn assemble(request: &BuildRequest) -> Result<PathBuf, ConfigDriveError> {
    info!(
        "Assembling config drive for guest {} ({})",
        request.guest.hostname, request.guest.uuid
    );

    let rendered = template::render_user_data(&request.user_data_template, &request.guest)?;
    let mut cloud_config = userdata::parse_cloud_config(&rendered);

    let mut ssh_keys = keys::collect_ssh_keys(&request.ssh_key_directory);
    keys::merge_config_keys(&cloud_config, &mut ssh_keys);
    info!("Collected {} SSH keys", ssh_keys.len());

    let injections = inject::plan_injections(&request.inject_directory);
    info!("Planned {} file injections", injections.len());

    userdata::rewrite_cloud_config(&mut cloud_config, &ssh_keys);
    let user_data_file = userdata::write_user_data(&cloud_config)?;

    let document = metadata::build_metadata(&request.guest, &ssh_keys, &injections);
    let meta_data_file = metadata::write_metadata(&document)?;

    image::assemble_image(
        &request.output_iso,
        &meta_data_file,
        &user_data_file,
        &injections,
    )?;

    debug!("Removing temporary documents");
    fs::remove_file(&meta_data_file)?;
    fs::remove_file(&user_data_file)?;

    Ok(request.output_iso.clone())
}
