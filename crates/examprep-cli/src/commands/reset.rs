use examprep_core::Config;

use super::{open_session, CmdResult};

pub fn run(yes: bool, config: &Config) -> CmdResult {
    if !yes {
        eprintln!(
            "This clears your progress, notes and settings and cannot be undone. \
             Re-run with --yes to continue."
        );
        std::process::exit(2);
    }
    let mut session = open_session(config)?;
    session.reset_all()?;
    println!("all data reset");
    Ok(())
}
