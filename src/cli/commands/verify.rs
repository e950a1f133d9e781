//! `securevault verify` — check the master password.

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;

/// Execute the `verify` command.
pub fn execute(ctx: &Context) -> Result<()> {
    ctx.unlock()?;
    output::success("Password verified");
    Ok(())
}
