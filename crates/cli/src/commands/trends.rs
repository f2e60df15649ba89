use tailor_core::config::LoadOptions;

use super::{load_session, CommandResult, Reply};

pub const NAME: &str = "trends";

pub fn run(options: &LoadOptions, items: &[String]) -> CommandResult {
    CommandResult::from_outcome(NAME, execute(options, items))
}

fn execute(options: &LoadOptions, items: &[String]) -> anyhow::Result<Reply> {
    let (session, _) = load_session(options)?;
    let rows = session.sales_trend(items);
    if rows.is_empty() {
        return Ok(Reply::miss(format!("no sales history for {}", items.join(", "))));
    }
    Reply::data(rows)
}
