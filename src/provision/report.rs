//! Credentials hand-out file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use log::info;

use super::ProvisionedUser;
use crate::error::ProvisionError;

const RULE_WIDTH: usize = 70;

/// Renders the Username/Password/Role/Name table given to account holders.
pub fn render_credentials_file(users: &[ProvisionedUser]) -> String {
    let mut out = String::new();
    out.push_str("PSX Financial Analysis - User Credentials\n");
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push_str("\n\n");
    out.push_str(&format!(
        "{:<15} {:<15} {:<12} {}\n",
        "Username", "Password", "Role", "Name"
    ));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    for user in users {
        out.push_str(&format!(
            "{:<15} {:<15} {:<12} {}\n",
            user.username,
            user.password,
            user.role.as_str(),
            user.name
        ));
    }

    out.push('\n');
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');
    out.push_str("IMPORTANT: Keep this file secure and delete it when no longer needed.\n");
    out
}

/// Writes the SQL script and the credentials file. The credentials file is
/// created owner-readable only on Unix.
pub fn write_outputs(
    sql_path: &Path,
    sql: &str,
    credentials_path: &Path,
    credentials: &str,
) -> Result<(), ProvisionError> {
    fs::write(sql_path, sql)?;
    info!("Wrote SQL script to {}", sql_path.display());

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(credentials_path)?;
    file.write_all(credentials.as_bytes())?;
    info!("Wrote credentials to {}", credentials_path.display());
    Ok(())
}
