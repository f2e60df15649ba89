use tailor_core::config::LoadOptions;
use tailor_core::AnalyticsError;

use super::{load_session, CommandResult, Reply};

pub const NAME: &str = "timing";

pub fn run(options: &LoadOptions) -> CommandResult {
    CommandResult::from_outcome(NAME, execute(options))
}

fn execute(options: &LoadOptions) -> anyhow::Result<Reply> {
    let (session, _) = load_session(options)?;
    Reply::data(session.timing().map_err(AnalyticsError::from)?)
}
