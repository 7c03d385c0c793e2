// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unito login` and `unito logout`.

use secrecy::SecretString;
use unito_billing::PortalContext;
use unito_core::UnitoError;

/// Environment variable that supplies the password non-interactively.
pub const PASSWORD_ENV_VAR: &str = "UNITO_PASSWORD";

/// Password from `UNITO_PASSWORD`, or an interactive prompt.
fn read_password() -> Result<SecretString, UnitoError> {
    if let Ok(password) = std::env::var(PASSWORD_ENV_VAR)
        && !password.is_empty()
    {
        return Ok(SecretString::from(password));
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        eprint!("Password: ");
        let password = rpassword::read_password()
            .map_err(|e| UnitoError::Internal(format!("failed to read password: {e}")))?;
        if password.is_empty() {
            return Err(UnitoError::Config("empty password not allowed".to_string()));
        }
        return Ok(SecretString::from(password));
    }

    Err(UnitoError::Config(format!(
        "No password provided. Set {PASSWORD_ENV_VAR} or run interactively."
    )))
}

pub async fn run_login(portal: &PortalContext, email: &str) -> Result<(), UnitoError> {
    let password = read_password()?;
    let user = portal.session().login(email, &password).await?;

    let name = if user.full_name.is_empty() {
        user.email.as_str()
    } else {
        user.full_name.as_str()
    };
    println!("Logged in as {name}.");

    // Surface billing problems right away.
    portal.refresh_all().await;
    if let Some(reason) = portal.lock_reason() {
        println!("Portal is read-only: {reason}.");
    } else if portal.contract().status().needs_signing() {
        println!("Your service agreement is not signed yet. Run `unito contract sign`.");
    }
    Ok(())
}

pub async fn run_logout(portal: &PortalContext) {
    portal.session().logout().await;
    println!("Logged out.");
}
