use serde::Serialize;
use tailor_core::config::LoadOptions;
use tailor_core::{ItemName, SimilarItem};

use super::{load_session, CommandResult, Reply};

pub const NAME: &str = "similarity";

#[derive(Debug, Serialize)]
struct SimilarItems {
    item: ItemName,
    similar: Vec<SimilarItem>,
}

/// Without `item`, prints the whole matrix with `null` for undefined cells.
pub fn run(options: &LoadOptions, item: Option<&str>, top_n: usize) -> CommandResult {
    CommandResult::from_outcome(NAME, execute(options, item, top_n))
}

fn execute(options: &LoadOptions, item: Option<&str>, top_n: usize) -> anyhow::Result<Reply> {
    let (session, _) = load_session(options)?;

    let Some(query) = item else {
        return Reply::data(session.similarity());
    };
    let Some(item) = session.lookup_item(query) else {
        return Ok(Reply::miss(format!("no item matches `{query}`")));
    };
    match session.similar_items(item.as_str(), top_n) {
        Some(similar) => Reply::data(SimilarItems { item, similar }),
        None => Ok(Reply::miss(format!("`{item}` has no ratings in this snapshot"))),
    }
}
