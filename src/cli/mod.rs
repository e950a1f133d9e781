//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use zeroize::Zeroizing;

use crate::auth::{FileCredentialStore, VaultAuth};
use crate::config::Settings;
use crate::crypto::FieldCipher;
use crate::errors::{Result, VaultError};
use crate::export::BillFrequency;
use crate::keystore::{self, KeyGuard, KeyStore};
use crate::vault::{RecordKind, RecordStore, Vault};

/// Environment variable holding the master password (CI, scripts).
pub const PASSWORD_ENV: &str = "SECUREVAULT_PASSWORD";

/// Environment variable holding the export/import passphrase.
pub const EXPORT_PASSPHRASE_ENV: &str = "SECUREVAULT_EXPORT_PASSPHRASE";

/// SecureVault CLI: encrypted passwords, bills and notes.
#[derive(Parser)]
#[command(
    name = "securevault",
    about = "Encrypted password, bill and note vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project directory holding `.securevault.toml` (default: current directory)
    #[arg(short = 'C', long, global = true)]
    pub dir: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Set up the master password
    Init,

    /// Check the master password
    Verify,

    /// Add a credential, bill or note
    Add {
        #[command(subcommand)]
        record: AddRecord,
    },

    /// List records (titles and clear metadata only)
    List {
        /// Only this kind: credentials, bills or notes
        kind: Option<RecordKind>,
    },

    /// Show a decrypted record
    Show {
        /// credential, bill or note
        kind: RecordKind,
        id: i64,
    },

    /// Delete a record
    Delete {
        /// credential, bill or note
        kind: RecordKind,
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Export every record to a passphrase-encrypted bundle
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import records from an exported bundle
    Import {
        /// Path to the bundle
        file: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Record kinds accepted by `add`.
#[derive(clap::Subcommand)]
pub enum AddRecord {
    /// A login: title, username, password, url, notes
    Credential {
        title: String,
        #[arg(short, long)]
        username: Option<String>,
        /// Password (omit for interactive prompt)
        #[arg(short, long)]
        password: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// A recurring bill
    Bill {
        name: String,
        /// Amount (omit for interactive prompt)
        #[arg(short, long)]
        amount: Option<String>,
        /// Due date, YYYY-MM-DD
        #[arg(short, long)]
        due: String,
        /// monthly, quarterly, semi-annual or annual
        #[arg(short, long, default_value = "monthly")]
        frequency: BillFrequency,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// A free-form secure note
    Note {
        title: String,
        /// Note body (omit for interactive prompt)
        #[arg(short, long)]
        content: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolved project directory and settings for one invocation.
pub struct Context {
    pub project_dir: PathBuf,
    pub settings: Settings,
}

impl Context {
    pub fn load(cli: &Cli) -> Result<Self> {
        let project_dir = match &cli.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let settings = Settings::load(&project_dir)?;
        Ok(Self {
            project_dir,
            settings,
        })
    }

    pub fn auth(&self) -> VaultAuth<FileCredentialStore> {
        VaultAuth::new(FileCredentialStore::new(
            self.settings.auth_path(&self.project_dir),
        ))
    }

    /// Prompt for the master password and check it.
    pub fn unlock(&self) -> Result<()> {
        let auth = self.auth();
        if !auth.is_setup()? {
            output::tip("Run `securevault init` to set up a master password.");
            return Err(VaultError::NotSetup);
        }

        let password = prompt_password()?;
        auth.unlock(&password)
    }

    /// The configured device key store, behind a `KeyGuard`.
    pub fn keys(&self) -> Result<Arc<KeyGuard<Box<dyn KeyStore>>>> {
        let store = keystore::open_store(&self.settings, &self.project_dir)?;
        Ok(Arc::new(KeyGuard::new(store)))
    }

    /// Open the record vault with the configured key and record stores.
    pub fn open_vault(&self) -> Result<Vault<Box<dyn RecordStore>>> {
        let cipher = FieldCipher::new(self.keys()?);
        let records = open_record_store(&self.settings.records_path(&self.project_dir))?;
        Ok(Vault::new(cipher, records))
    }

    /// Unlock, then open the vault.
    pub fn unlock_vault(&self) -> Result<Vault<Box<dyn RecordStore>>> {
        self.unlock()?;
        self.open_vault()
    }
}

#[cfg(feature = "sqlite-store")]
fn open_record_store(path: &Path) -> Result<Box<dyn RecordStore>> {
    Ok(Box::new(crate::vault::SqliteRecordStore::open(path)?))
}

#[cfg(not(feature = "sqlite-store"))]
fn open_record_store(_path: &Path) -> Result<Box<dyn RecordStore>> {
    Err(VaultError::Config(
        "no record store compiled — rebuild with the default `sqlite-store` feature".into(),
    ))
}

/// Read a non-empty value from `var`, if set.
fn from_env(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(Zeroizing::new)
}

/// Get the master password from `SECUREVAULT_PASSWORD` or an interactive prompt.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = from_env(PASSWORD_ENV) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Master password")
        .allow_empty_password(true)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation (used during `init`).
///
/// Also respects `SECUREVAULT_PASSWORD` for scripted use. Enforces a
/// minimum length.
pub fn prompt_new_password(min_len: usize) -> Result<Zeroizing<String>> {
    if let Some(pw) = from_env(PASSWORD_ENV) {
        if pw.chars().count() < min_len {
            return Err(VaultError::CommandFailed(format!(
                "password must be at least {min_len} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose master password")
            .with_confirmation(
                "Confirm master password",
                "Passwords do not match, try again",
            )
            .interact()
            .map(Zeroizing::new)
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;

        if password.chars().count() < min_len {
            output::warning(&format!(
                "Password must be at least {min_len} characters. Try again."
            ));
            continue;
        }

        return Ok(password);
    }
}

/// Get the export passphrase from `SECUREVAULT_EXPORT_PASSPHRASE` or a prompt.
///
/// `confirm` asks twice, for export; import asks once.
pub fn prompt_export_passphrase(confirm: bool) -> Result<Zeroizing<String>> {
    if let Some(pw) = from_env(EXPORT_PASSPHRASE_ENV) {
        return Ok(pw);
    }

    let mut prompt = dialoguer::Password::new().with_prompt("Export passphrase");
    if confirm {
        prompt = prompt.with_confirmation(
            "Confirm export passphrase",
            "Passphrases do not match, try again",
        );
    }
    let pw = prompt
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Use `value` if given, otherwise prompt for it without echo.
pub fn secret_or_prompt(value: Option<String>, label: &str) -> Result<Zeroizing<String>> {
    if let Some(value) = value {
        return Ok(Zeroizing::new(value));
    }

    let pw = dialoguer::Password::new()
        .with_prompt(label)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("{label} prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Ask a yes/no question, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))
}
