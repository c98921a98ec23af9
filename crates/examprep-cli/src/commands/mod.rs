pub mod config;
pub mod record;
pub mod rescue;
pub mod reset;
pub mod settings;
pub mod setup;
pub mod status;
pub mod study;

use examprep_core::{Config, Session, Store, SystemClock};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Load the store and run the session-start effects. Each CLI invocation is one load.
pub fn open_session(config: &Config) -> Result<Session, Box<dyn std::error::Error>> {
    let store = Store::open()?;
    tracing::debug!(?config, "opening session");
    let mut session = Session::new(store, Box::new(SystemClock), config);
    let report = session.start()?;
    if report.rescue_offered {
        if let Some(brk) = report.streak_break {
            eprintln!(
                "Your {}-day streak broke (last studied {}). Run `examprep rescue submit` to revive it.",
                brk.streak, brk.last_studied
            );
        }
    }
    Ok(session)
}

/// Like [`open_session`] but refuses to continue before first-time setup.
pub fn open_ready_session(config: &Config) -> Result<Session, Box<dyn std::error::Error>> {
    let session = open_session(config)?;
    session.ensure_setup_complete()?;
    Ok(session)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
