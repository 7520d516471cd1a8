//! The `user-admin` menu.

use std::io::{BufRead, Write};

use sensorgate_api::auth::password::validate_password_strength;
use sensorgate_api::auth::{AuthError, AuthService};
use sensorgate_db::StoreError;

use crate::console::Console;

/// Shortest password accepted for new or changed credentials.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const MENU: &str = "\
[c]reate user  [u]pdate password  [r]emove user
[p]assword check  [l]ist users  [q]uit";

/// One menu choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Create,
    Update,
    Remove,
    CheckPassword,
    List,
    Quit,
}

impl UserCommand {
    /// Accepts the single-letter and long forms, case-insensitively.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "c" | "create" => Some(Self::Create),
            "u" | "update" => Some(Self::Update),
            "r" | "remove" => Some(Self::Remove),
            "p" | "password" => Some(Self::CheckPassword),
            "l" | "list" => Some(Self::List),
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
        let Some(choice) = console.prompt("user-admin> ")? else {
            return Ok(());
        };
        if choice.trim().is_empty() {
            continue;
        }

        let Some(command) = UserCommand::parse(&choice) else {
            console.say(format!("Unknown command {:?}", choice.trim()))?;
            console.say(MENU)?;
            continue;
        };

        let finished = match command {
            UserCommand::Create => create(auth, console).await?,
            UserCommand::Update => update(auth, console).await?,
            UserCommand::Remove => remove(auth, console).await?,
            UserCommand::CheckPassword => check_password(auth, console).await?,
            UserCommand::List => list(auth, console).await?,
            UserCommand::Quit => return Ok(()),
        };
        if finished {
            return Ok(());
        }
    }
}

// ---------------------------------------------------------------------------
// Commands. Each returns `true` when input ran out mid-command.
// ---------------------------------------------------------------------------

async fn create<R: BufRead, W: Write>(
    auth: &AuthService,
    console: &mut Console<R, W>,
) -> anyhow::Result<bool> {
    let Some(username) = ask_username(console)? else {
        return Ok(true);
    };
    let Some(password) = ask_new_password(console)? else {
        return Ok(true);
    };
    let Some(password) = password else {
        return Ok(false);
    };

    match auth.create_user(&username, &password).await {
        Ok(_) => {
            tracing::info!(%username, "Created user");
            console.say(format!("Created user {username}"))?;
        }
        Err(AuthError::Store(StoreError::AlreadyExists)) => {
            console.say(format!("User {username} already exists"))?;
        }
        Err(AuthError::Store(StoreError::InvalidInput(msg))) => console.say(msg)?,
        Err(e) => report(console, "Creating user failed", &e)?,
    }
    Ok(false)
}

async fn update<R: BufRead, W: Write>(
    auth: &AuthService,
    console: &mut Console<R, W>,
) -> anyhow::Result<bool> {
    let Some(username) = ask_username(console)? else {
        return Ok(true);
    };
    let Some(password) = ask_new_password(console)? else {
        return Ok(true);
    };
    let Some(password) = password else {
        return Ok(false);
    };

    match auth.change_password(&username, &password).await {
        Ok(()) => {
            tracing::info!(%username, "Changed password");
            console.say(format!("Updated password for {username}"))?;
        }
        Err(AuthError::Store(StoreError::NotFound)) => {
            console.say(format!("No such user {username}"))?;
        }
        Err(e) => report(console, "Updating password failed", &e)?,
    }
    Ok(false)
}

async fn remove<R: BufRead, W: Write>(
    auth: &AuthService,
    console: &mut Console<R, W>,
) -> anyhow::Result<bool> {
    let Some(username) = ask_username(console)? else {
        return Ok(true);
    };

    match auth.credentials().remove_user(&username).await {
        Ok(true) => {
            tracing::info!(%username, "Removed user");
            console.say(format!("Removed user {username}"))?;
        }
        Ok(false) => console.say(format!("No such user {username}"))?,
        Err(e) => report(console, "Removing user failed", &e)?,
    }
    Ok(false)
}

async fn check_password<R: BufRead, W: Write>(
    auth: &AuthService,
    console: &mut Console<R, W>,
) -> anyhow::Result<bool> {
    let Some(username) = ask_username(console)? else {
        return Ok(true);
    };
    let Some(password) = console.prompt("Password: ")? else {
        return Ok(true);
    };

    if auth.authorise(&username, &password).await {
        console.say("Password is correct")?;
    } else {
        console.say("Password is incorrect")?;
    }
    Ok(false)
}

async fn list<R: BufRead, W: Write>(
    auth: &AuthService,
    console: &mut Console<R, W>,
) -> anyhow::Result<bool> {
    match auth.credentials().list_usernames().await {
        Ok(names) if names.is_empty() => console.say("No users")?,
        Ok(names) => {
            for name in names {
                console.say(format!("  {name}"))?;
            }
        }
        Err(e) => report(console, "Listing users failed", &e)?,
    }
    Ok(false)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Prompt until a non-blank username is given. `None` at end of input.
fn ask_username<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
) -> std::io::Result<Option<String>> {
    loop {
        let Some(name) = console.prompt("Username: ")? else {
            return Ok(None);
        };
        let name = name.trim();
        if !name.is_empty() {
            return Ok(Some(name.to_string()));
        }
        console.say("Username must not be empty")?;
    }
}

/// Prompt for a new password and its confirmation.
///
/// Outer `None` is end of input; inner `None` means the password was
/// rejected and the command should be abandoned.
fn ask_new_password<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
) -> std::io::Result<Option<Option<String>>> {
    let Some(password) = console.prompt("New password: ")? else {
        return Ok(None);
    };
    if let Err(msg) = validate_password_strength(&password, MIN_PASSWORD_LENGTH) {
        console.say(msg)?;
        return Ok(Some(None));
    }

    let Some(confirm) = console.prompt("Repeat password: ")? else {
        return Ok(None);
    };
    if confirm != password {
        console.say("Passwords do not match")?;
        return Ok(Some(None));
    }
    Ok(Some(Some(password)))
}

fn report<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    context: &str,
    err: &dyn std::error::Error,
) -> std::io::Result<()> {
    tracing::error!(error = %err, "{context}");
    console.say(format!("{context}: {err}"))
}
