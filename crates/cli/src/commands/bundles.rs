use serde::Serialize;
use tailor_core::config::LoadOptions;
use tailor_core::{AnchorOutcome, BundleRecommendation, ItemName, SkipReason, SkippedAnchor};

use super::{load_session, CommandResult, Reply};

pub const NAME: &str = "bundles";

#[derive(Debug, Serialize)]
struct BundleTable<'a> {
    recommendations: Vec<&'a BundleRecommendation>,
    skipped: Vec<SkippedAnchor>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum AnchorPayload<'a> {
    Recommended { item: ItemName, recommendations: &'a [BundleRecommendation] },
    Skipped { item: ItemName, reason: SkipReason },
}

pub fn run(options: &LoadOptions, item: Option<&str>) -> CommandResult {
    CommandResult::from_outcome(NAME, execute(options, item))
}

fn execute(options: &LoadOptions, item: Option<&str>) -> anyhow::Result<Reply> {
    let (session, _) = load_session(options)?;
    let batch = session.bundles();

    let Some(query) = item else {
        return Reply::data(BundleTable {
            recommendations: batch.recommendations(),
            skipped: batch.skipped(),
        });
    };
    let Some(item) = session.lookup_item(query) else {
        return Ok(Reply::miss(format!("no item matches `{query}`")));
    };
    match batch.outcome(&item) {
        Some(AnchorOutcome::Recommended(list)) => {
            Reply::data(AnchorPayload::Recommended { item, recommendations: list })
        }
        Some(AnchorOutcome::Skipped { reason }) => {
            Reply::data(AnchorPayload::Skipped { item, reason: *reason })
        }
        None => Ok(Reply::miss(format!("`{item}` has no purchases in this snapshot"))),
    }
}
