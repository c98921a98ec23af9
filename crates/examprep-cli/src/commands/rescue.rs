use clap::Subcommand;
use examprep_core::{Config, QuizOutcome};
use serde_json::json;

use super::{open_ready_session, print_json, CmdResult};

#[derive(Subcommand)]
pub enum RescueAction {
    /// Show whether a rescue is on offer
    Status,
    /// Submit the rescue quiz result
    Submit {
        /// Correct answers
        #[arg(long)]
        score: u32,
        /// Questions asked
        #[arg(long)]
        total: u32,
    },
    /// Give up on the rescue for this session
    Dismiss,
}

pub fn run(action: RescueAction, config: &Config) -> CmdResult {
    let mut session = open_ready_session(config)?;
    match action {
        RescueAction::Status => {
            let rescue = session.rescue();
            print_json(&json!({
                "state": rescue.state(),
                "streakBreak": rescue.offered_for(),
                "passPercent": session.pass_percent(),
            }))
        }
        RescueAction::Submit { score, total } => {
            let result = session.submit_rescue(QuizOutcome { score, total })?;
            println!("{}", result.message());
            Ok(())
        }
        RescueAction::Dismiss => {
            let result = session.dismiss_rescue()?;
            println!("{}", result.message());
            Ok(())
        }
    }
}
