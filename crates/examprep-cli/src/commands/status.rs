use examprep_core::Config;

use super::{open_ready_session, print_json, CmdResult};

pub fn run(config: &Config) -> CmdResult {
    let session = open_ready_session(config)?;
    print_json(&session.status())
}
