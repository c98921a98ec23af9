use clap::Subcommand;
use examprep_core::{Collection, Config, Record};

use super::{open_ready_session, print_json, CmdResult};

#[derive(Subcommand)]
pub enum RecordAction {
    /// Append a JSON record to a collection
    Add {
        /// mock-tests, completion-history, reminders, quiz-history or doubts
        collection: Collection,
        /// Record as a JSON object
        json: String,
    },
    /// List a collection
    List {
        collection: Collection,
    },
    /// Set the tracking progress entry for a subject or chapter
    Progress {
        /// Subject or chapter identifier
        id: String,
        /// Progress value as JSON
        json: String,
    },
}

pub fn run(action: RecordAction, config: &Config) -> CmdResult {
    let mut session = open_ready_session(config)?;
    match action {
        RecordAction::Add { collection, json } => {
            let record: Record = serde_json::from_str(&json)?;
            let len = session.add_record(collection, record)?;
            println!("added ({len} total)");
            Ok(())
        }
        RecordAction::List { collection } => print_json(&session.store().records(collection)),
        RecordAction::Progress { id, json } => {
            let value: Record = serde_json::from_str(&json)?;
            session.set_progress(&id, value)?;
            println!("ok");
            Ok(())
        }
    }
}
