use clap::Subcommand;
use examprep_core::{Config, Credit, CreditOutcome, StreakChange};

use super::{open_ready_session, print_json, CmdResult};

#[derive(Subcommand)]
pub enum StudyAction {
    /// Mark a chapter as completed
    Chapter {
        /// Experience to award
        #[arg(long, default_value_t = 50)]
        xp: u64,
    },
    /// Log focused study time
    Hours {
        /// Hours studied
        hours: f64,
        /// Experience to award
        #[arg(long, default_value_t = 25)]
        xp: u64,
    },
    /// Record a finished practice quiz
    Quiz {
        /// Experience to award
        #[arg(long, default_value_t = 20)]
        xp: u64,
    },
}

pub fn run(action: StudyAction, config: &Config) -> CmdResult {
    let mut session = open_ready_session(config)?;
    let outcome = match action {
        StudyAction::Chapter { xp } => session.complete_chapter(xp)?,
        StudyAction::Hours { hours, xp } => session.log_study_hours(hours, xp)?,
        StudyAction::Quiz { xp } => session.credit(Credit::study(xp))?,
    };
    announce(&outcome);
    print_json(&outcome)
}

fn announce(outcome: &CreditOutcome) {
    if let StreakChange::Restarted { lost } = outcome.change {
        eprintln!("Your {lost}-day streak was broken; a new streak starts today.");
    }
    if outcome.leveled_up() {
        eprintln!("Level up! You reached level {}.", outcome.level_after);
    }
}
