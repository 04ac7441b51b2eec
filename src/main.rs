//! phenoportal-login - command-line smoke tool for the session layer.
//!
//! Checks (and optionally establishes) a PhenoPortal session from a
//! terminal, using the same configuration surface and credential state file
//! as the application itself:
//!
//! ```text
//! phenoportal-login                # run the auth check, print the outcome
//! phenoportal-login login <user>   # prompt for a password and log in
//! phenoportal-login logout         # sign out locally and server-side
//! ```
//!
//! Configuration comes from `PHENOPORTAL_*` environment variables, with a
//! `.env` file honored if present.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use phenoportal_session::{Config, FileCredentialStore, SessionManager, SessionStatus};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g. RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env()?;
    let store = Arc::new(FileCredentialStore::open(config.state_file()?)?);
    let mut session = SessionManager::new(&config, store)?;

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None => check(&mut session).await,
        Some("login") => {
            let username = args
                .get(2)
                .context("Usage: phenoportal-login login <username>")?;
            login(&mut session, username).await
        }
        Some("logout") => {
            let destination = session.logout(&config.login_path).await;
            println!("Signed out; next stop: {}", destination);
            Ok(())
        }
        Some(other) => anyhow::bail!("Unknown command: {}", other),
    }
}

async fn check(session: &mut SessionManager) -> Result<()> {
    let logged_in = session.ensure_authenticated().await;
    report(session, logged_in);
    Ok(())
}

async fn login(session: &mut SessionManager, username: &str) -> Result<()> {
    print!("Password for {}: ", username);
    io::stdout().flush()?;
    let password = rpassword::read_password().context("Failed to read password")?;

    session.login(username, &password).await?;
    report(session, session.status() == SessionStatus::Authenticated);
    Ok(())
}

fn report(session: &SessionManager, logged_in: bool) {
    match session.user() {
        Some(profile) if logged_in => println!("Logged in as {}", profile.username),
        _ => println!("Not logged in"),
    }
}
