use clap::Args;
use examprep_core::{Config, ExamLevel, FocusedGroup, Settings};

use super::{open_session, CmdResult};

#[derive(Args)]
pub struct SetupArgs {
    /// Your name
    #[arg(long, default_value = "Student")]
    name: String,
    /// Exam level (foundation, intermediate, final)
    #[arg(long, default_value = "intermediate")]
    level: ExamLevel,
    /// Chapters to finish each week
    #[arg(long, default_value_t = 10)]
    weekly_chapters: u32,
    /// Hours to study each day
    #[arg(long, default_value_t = 4.0)]
    daily_hours: f64,
    /// Planned revision rounds
    #[arg(long, default_value_t = 3)]
    revisions: u32,
    /// Paper group (group1, group2, both)
    #[arg(long, default_value = "both")]
    group: FocusedGroup,
    /// Exam attempt, e.g. "jan26"
    #[arg(long, default_value = "jan26")]
    attempt: String,
}

pub fn run(args: SetupArgs, config: &Config) -> CmdResult {
    let mut session = open_session(config)?;
    if session.is_setup_complete() {
        println!("already set up; use `examprep settings set` to change settings");
        return Ok(());
    }
    let settings = Settings {
        name: args.name,
        level: args.level,
        weekly_chapter_goal: args.weekly_chapters,
        daily_hours_goal: args.daily_hours,
        revisions: args.revisions,
        focused_group: args.group,
        exam_attempt: args.attempt,
    };
    session.complete_setup(settings)?;
    println!("setup complete");
    Ok(())
}
