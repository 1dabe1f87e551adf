//! Jinja2-compatible user-data template rendering
//!
//! The template file is resolved relative to the current working directory
//! and rendered with the guest identity. Rendering happens before keys are
//! collected and injections are planned, so the `sshkeys` and `inject` names
//! are defined but empty; the aggregated keys reach the guest through the
//! cloud-config rewrite instead.

use crate::{ConfigDriveError, GuestIdentity};
use minijinja::Environment;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Build the template context for a guest
pub fn build_context(guest: &GuestIdentity) -> HashMap<String, minijinja::Value> {
    let mut context = HashMap::new();
    context.insert(
        "guestname".to_string(),
        minijinja::Value::from(guest.hostname.clone()),
    );
    context.insert(
        "uuid".to_string(),
        minijinja::Value::from(guest.uuid.to_string()),
    );
    context.insert(
        "sshkeys".to_string(),
        minijinja::Value::from_serialize(&Vec::<String>::new()),
    );
    context.insert(
        "inject".to_string(),
        minijinja::Value::from_serialize(&Vec::<String>::new()),
    );
    context
}

/// Render the user-data template at `path` for `guest`.
///
/// A missing template file or a template syntax/render error is fatal.
pub fn render_user_data(path: &Path, guest: &GuestIdentity) -> Result<String, ConfigDriveError> {
    let source = fs::read_to_string(path).map_err(|e| {
        ConfigDriveError::Template(format!("cannot read template {}: {}", path.display(), e))
    })?;
    render_with_context(&source, &build_context(guest))
}

/// Render a template string with a prepared context
pub fn render_with_context(
    source: &str,
    context: &HashMap<String, minijinja::Value>,
) -> Result<String, ConfigDriveError> {
    debug!("Rendering user-data template");

    let mut env = Environment::new();
    env.add_template("user_data", source)
        .map_err(|e| ConfigDriveError::Template(format!("Template parse error: {}", e)))?;

    let tmpl = env
        .get_template("user_data")
        .map_err(|e| ConfigDriveError::Template(format!("Template error: {}", e)))?;

    let rendered = tmpl
        .render(context)
        .map_err(|e| ConfigDriveError::Template(format!("Template render error: {}", e)))?;

    debug!("Rendered user data:\n{}", rendered);
    Ok(rendered)
}
