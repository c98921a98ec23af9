use clap::Subcommand;
use examprep_core::{ApplyOutcome, Config};

use super::{open_ready_session, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Show,
    /// Change one settings field
    Set {
        /// Field name (e.g. "name", "level", "dailyHoursGoal")
        field: String,
        /// New value
        value: String,
        /// Confirm a level change, which resets progress, stats and history
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: SettingsAction, config: &Config) -> CmdResult {
    let mut session = open_ready_session(config)?;
    match action {
        SettingsAction::Show => print_json(&session.store().settings()),
        SettingsAction::Set { field, value, yes } => {
            let next = session.store().settings().with_field(&field, &value)?;
            match session.apply_settings(next)? {
                ApplyOutcome::Saved => {
                    println!("Settings have been saved successfully!");
                }
                ApplyOutcome::ConfirmationRequired { token, from, to } => {
                    if yes {
                        session.commit_level_change(token)?;
                        println!("level changed from {from} to {to}; study progress reset");
                    } else {
                        session.cancel_level_change(token)?;
                        eprintln!(
                            "Changing your level from {from} to {to} will reset your study progress \
                             to match the new syllabus. Re-run with --yes to continue."
                        );
                        std::process::exit(2);
                    }
                }
            }
            Ok(())
        }
    }
}
