//! Installer command line and output naming.

use std::path::Path;

use crate::archive::ArchiveFormat;
use crate::consts::DIRECTOR_APP_ID;

/// Arguments for one installer run that provisions `install_units` from
/// `repositories` into the extracted image at `destination`.
pub fn installer_args(profile: &str, install_units: &[String], repositories: &[String], destination: &Path) -> Vec<String> {
  vec![
    "-nosplash".to_string(),
    "-application".to_string(),
    DIRECTOR_APP_ID.to_string(),
    "-consoleLog".to_string(),
    "-profileProperties".to_string(),
    "org.eclipse.update.install.features=true".to_string(),
    "-profile".to_string(),
    profile.to_string(),
    "-installIU".to_string(),
    install_units.join(","),
    "-repository".to_string(),
    repositories.join(","),
    "-destination".to_string(),
    destination.display().to_string(),
  ]
}

/// Name of the repackaged archive: `<base name>-<app name><suffix>`.
///
/// `sdk-linux.tar.gz` with app `myapp` becomes `sdk-linux-myapp.tar.gz`. Returns
/// `None` for names without a supported archive suffix.
pub fn distribution_file_name(base_image_name: &str, app_name: &str) -> Option<String> {
  let suffix = ArchiveFormat::from_name(base_image_name)?.suffix();
  let stem = &base_image_name[..base_image_name.len() - suffix.len()];
  Some(format!("{stem}-{app_name}{suffix}"))
}
