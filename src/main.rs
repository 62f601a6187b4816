//! psx-auth - Entry Point
//!
//! Provisions demo accounts and exercises the authentication strategies
//! from the command line.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use psx_auth::auth::{PasswordHasher, build_authenticator};
use psx_auth::config::AuthConfig;
use psx_auth::error::handlers::{error_to_exit_code, handle_error};
use psx_auth::error::{BuildError, PsxAuthError, StoreError};
use psx_auth::provision::{Provisioner, default_roster, load_roster, persist};
use psx_auth::store::{self, UserStore};
use psx_auth::utils::input::read_password_from_stdin;
use psx_auth::utils::logging::setup_logging;

#[derive(Parser)]
#[command(name = "psx-auth", version, about = "Account tooling for the PSX financial assistant")]
struct Cli {
    /// Configuration file (defaults to ./psx-auth.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate accounts, write the SQL script and credentials file
    Provision {
        /// JSON roster; the ten demo accounts when omitted
        #[arg(long)]
        roster: Option<PathBuf>,
        #[arg(long)]
        sql_out: Option<PathBuf>,
        #[arg(long)]
        credentials_out: Option<PathBuf>,
        /// Also insert the accounts into the configured database
        #[arg(long)]
        insert: bool,
    },
    /// Derive a salted hash for a password (read from stdin when omitted)
    Hash { password: Option<OsString> },
    /// Check a password against a stored hash and salt
    Verify {
        /// Read from stdin when omitted
        password: Option<String>,
        #[arg(long)]
        hash: String,
        #[arg(long)]
        salt: String,
    },
    /// Authenticate with the configured strategy
    Login {
        username: String,
        /// Read from stdin when omitted
        password: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AuthConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            setup_logging("info");
            return fail(PsxAuthError::from(e));
        }
    };
    setup_logging(&config.log_level);

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(err) => fail(err),
    }
}

fn fail(err: PsxAuthError) -> ExitCode {
    handle_error(&err);
    ExitCode::from(error_to_exit_code(&err))
}

fn run(command: Commands, config: &AuthConfig) -> Result<ExitCode, PsxAuthError> {
    match command {
        Commands::Provision {
            roster,
            sql_out,
            credentials_out,
            insert,
        } => {
            let sql_path = sql_out.unwrap_or_else(|| PathBuf::from(&config.sql_output));
            let credentials_path =
                credentials_out.unwrap_or_else(|| PathBuf::from(&config.credentials_output));
            provision(config, roster.as_deref(), &sql_path, &credentials_path, insert)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Hash { password } => {
            let hasher = PasswordHasher::from_config(config)?;
            let derived = match password {
                Some(password) => hasher.derive_os(&password)?,
                None => hasher.derive(&read_password_from_stdin()?)?,
            };
            println!("hash: {}", derived.hash);
            println!("salt: {}", derived.salt);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify {
            password,
            hash,
            salt,
        } => {
            let password = password_or_stdin(password)?;
            if PasswordHasher::from_config(config)?.verify(&password, &hash, &salt) {
                println!("match");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("no match");
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Login { username, password } => {
            let password = password_or_stdin(password)?;
            let store = store::open_configured(config)?.map(|s| s as Arc<dyn UserStore>);
            let service = build_authenticator(config, store)?;
            let user = service.login(&username, &password)?;
            let json = serde_json::to_string_pretty(&user).map_err(StoreError::from)?;
            println!("{}", json);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn password_or_stdin(password: Option<String>) -> Result<String, PsxAuthError> {
    match password {
        Some(password) => Ok(password),
        None => Ok(read_password_from_stdin()?),
    }
}

fn provision(
    config: &AuthConfig,
    roster_path: Option<&Path>,
    sql_path: &Path,
    credentials_path: &Path,
    insert: bool,
) -> Result<(), PsxAuthError> {
    let roster = match roster_path {
        Some(path) => load_roster(path)?,
        None => default_roster(),
    };

    let provisioner = Provisioner::from_config(config, "setup_script")?;
    let users = provisioner.provision(&roster)?;

    let db = if insert {
        Some(store::open_configured(config)?.ok_or(BuildError::MissingStore)?)
    } else {
        None
    };
    let users = persist(
        users,
        db.as_deref().map(|s| s as &dyn UserStore),
        sql_path,
        credentials_path,
    )?;

    println!("{:<15} {:<12} {}", "Username", "Role", "Name");
    println!("{}", "-".repeat(50));
    for user in &users {
        println!("{:<15} {:<12} {}", user.username, user.role.as_str(), user.name);
    }
    println!();
    println!("SQL script:  {}", sql_path.display());
    println!("Credentials: {}", credentials_path.display());
    Ok(())
}
