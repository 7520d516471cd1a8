//! Interactive management of gateway user accounts.

use std::io;
use std::process::ExitCode;

use sensorgate_admin::console::Console;
use sensorgate_admin::{database_url, init_tracing, open_auth_service, users};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("user-admin: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let auth = open_auth_service(&database_url()).await?;

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());
    users::run(&auth, &mut console).await
}
