//! `securevault init` — set up the master password and the device key.

use crate::cli::output;
use crate::cli::{prompt_new_password, Context};
use crate::errors::{Result, VaultError};
use crate::keystore::{KeyProvider, KeyStore};

/// Execute the `init` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let auth = ctx.auth();

    // 1. Refuse to overwrite an existing master credential.
    if auth.is_setup()? {
        output::tip("Use `securevault verify` to check your master password.");
        return Err(VaultError::AlreadySetup);
    }

    // 2. Prompt for a new password (with confirmation).
    let password = prompt_new_password(ctx.settings.min_password_len)?;

    // 3. Derive and store the credential.
    auth.setup_master_password(&password)?;
    output::success(&format!(
        "Master password set up in {}",
        ctx.settings.data_path(&ctx.project_dir).display()
    ));

    // 4. Create the device key up front so a broken key store shows up now.
    let keys = ctx.keys()?;
    keys.get_or_create_key()?;
    output::info(&format!("Device key ready ({} store)", keys.store().backend()));

    output::tip("Run `securevault add credential <TITLE>` to add a login.");
    output::tip("Run `securevault list` to see all records.");

    Ok(())
}
