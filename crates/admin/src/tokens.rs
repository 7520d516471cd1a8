//! The `token-admin` menu.

use std::io::{BufRead, Write};

use sensorgate_api::auth::AuthService;
use sensorgate_core::duration::parse_token_duration;

use crate::console::Console;

const MENU: &str = "[c]reate token  [r]evoke token  [v]alidate token  [q]uit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCommand {
    Create,
    Revoke,
    Validate,
    Quit,
}

impl TokenCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "c" | "create" => Some(Self::Create),
            "r" | "revoke" => Some(Self::Revoke),
            "v" | "validate" => Some(Self::Validate),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Run the menu until `quit` or end of input.
pub async fn run<R: BufRead, W: Write>(
    auth: &AuthService,
    console: &mut Console<R, W>,
) -> anyhow::Result<()> {
    console.say(MENU)?;

    loop {
        let Some(choice) = console.prompt("token-admin> ")? else {
            return Ok(());
        };
        if choice.trim().is_empty() {
            continue;
        }

        let Some(command) = TokenCommand::parse(&choice) else {
            console.say(format!("Unknown command {:?}", choice.trim()))?;
            console.say(MENU)?;
            continue;
        };

        let finished = match command {
            TokenCommand::Create => create(auth, console).await?,
            TokenCommand::Revoke => revoke(auth, console).await?,
            TokenCommand::Validate => validate(auth, console).await?,
            TokenCommand::Quit => return Ok(()),
        };
        if finished {
            return Ok(());
        }
    }
}

async fn create<R: BufRead, W: Write>(
    auth: &AuthService,
    console: &mut Console<R, W>,
) -> anyhow::Result<bool> {
    let Some(raw) = console.prompt("Duration (e.g. 72h, 4w, 1y; 0 for the default): ")? else {
        return Ok(true);
    };

    let duration = match parse_token_duration(&raw) {
        Ok(duration) => duration,
        Err(e) => {
            console.say(format!("Invalid duration {:?}: {e}", raw.trim()))?;
            return Ok(false);
        }
    };

    match auth.issue_token(duration).await {
        Ok(token) => {
            console.say(format!("Token: {}", token.token))?;
            console.say(format!(
                "Valid until: {}",
                token.valid_to.format("%Y-%m-%d %H:%M:%S UTC")
            ))?;
        }
        Err(e) => {
            tracing::error!(error = %e, "Token issuance failed");
            console.say(format!("Creating token failed: {e}"))?;
        }
    }
    Ok(false)
}

async fn revoke<R: BufRead, W: Write>(
    auth: &AuthService,
    console: &mut Console<R, W>,
) -> anyhow::Result<bool> {
    let Some(token) = console.prompt("Token: ")? else {
        return Ok(true);
    };

    match auth.revoke_token(token.trim()).await {
        Ok(true) => {
            tracing::info!("Revoked token");
            console.say("Token revoked")?;
        }
        Ok(false) => console.say("No such token")?,
        Err(e) => {
            tracing::error!(error = %e, "Token revocation failed");
            console.say(format!("Revoking token failed: {e}"))?;
        }
    }
    Ok(false)
}

async fn validate<R: BufRead, W: Write>(
    auth: &AuthService,
    console: &mut Console<R, W>,
) -> anyhow::Result<bool> {
    let Some(token) = console.prompt("Token: ")? else {
        return Ok(true);
    };

    let token = token.trim();
    if auth.validate_token(token).await {
        console.say("Token is valid")?;
    } else {
        console.say("Token is not valid")?;
    }

    match auth.tokens().find(token).await {
        Ok(Some(row)) => console.say(format!(
            "  from {} to {}{}",
            row.valid_from.format("%Y-%m-%d %H:%M:%S UTC"),
            row.valid_to.format("%Y-%m-%d %H:%M:%S UTC"),
            if row.revoked { " (revoked)" } else { "" }
        ))?,
        Ok(None) => console.say("  unknown token")?,
        Err(e) => tracing::warn!(error = %e, "Token lookup failed"),
    }
    Ok(false)
}
