//! configdrive - assemble an OpenStack-style config drive ISO image
//!
//! Gathers SSH public keys and files to inject, renders a user-data
//! template, writes a metadata document, and masters everything into one
//! image a cloud-init-compatible guest can consume.

use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use configdrive::{assemble, BuildRequest, ConfigDriveError, GuestIdentity};

#[derive(Parser)]
#[command(name = "configdrive")]
#[command(author, version, about = "Assemble a cloud-init config drive ISO image", long_about = None)]
struct Cli {
    /// Hostname of the guest machine
    guestname: String,

    /// Directory of files to inject into the config drive
    #[arg(short, long, default_value = "inject")]
    inject_directory: PathBuf,

    /// Output ISO file name
    #[arg(short, long, default_value = "configdrive.iso")]
    output: PathBuf,

    /// Directory of SSH public key files for the administrator account
    #[arg(short, long, default_value = "ssh")]
    ssh_key_directory: PathBuf,

    /// User data template file, resolved relative to the current directory
    #[arg(short, long, default_value = "user_data.jinja")]
    user_data_template: PathBuf,

    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn main() -> Result<(), ConfigDriveError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let request = BuildRequest {
        guest: GuestIdentity::new(cli.guestname),
        inject_directory: cli.inject_directory,
        ssh_key_directory: cli.ssh_key_directory,
        user_data_template: cli.user_data_template,
        output_iso: cli.output,
    };

    let image = assemble(&request)?;
    info!("Config drive written to {}", image.display());
    Ok(())
}
