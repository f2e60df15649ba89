use tailor_core::config::LoadOptions;
use tailor_core::{SegmentRow, Segmentation};

use super::{load_session, CommandResult, Reply};

pub const NAME: &str = "segments";

pub fn run(options: &LoadOptions, item: Option<&str>) -> CommandResult {
    CommandResult::from_outcome(NAME, execute(options, item))
}

fn execute(options: &LoadOptions, item: Option<&str>) -> anyhow::Result<Reply> {
    let (session, _) = load_session(options)?;
    let segmentation = session.segments();

    let Some(query) = item else {
        return Reply::data(segmentation);
    };
    let Some(item) = session.lookup_item(query) else {
        return Ok(Reply::miss(format!("no item matches `{query}`")));
    };
    let rows: Vec<SegmentRow> = segmentation.for_item(&item).cloned().collect();
    Reply::data(Segmentation { rows, ..segmentation })
}
