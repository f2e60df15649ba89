use serde::Serialize;
use tailor_core::config::LoadOptions;
use tailor_core::{IngestReport, SalesSummary};

use super::{load_session, CommandResult, Reply};

pub const NAME: &str = "summary";

#[derive(Debug, Serialize)]
struct SummaryPayload {
    run_id: String,
    ingest: IngestReport,
    overview: SalesSummary,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    CommandResult::from_outcome(NAME, execute(options))
}

fn execute(options: &LoadOptions) -> anyhow::Result<Reply> {
    let (session, ingest) = load_session(options)?;
    Reply::data(SummaryPayload {
        run_id: session.run_id().to_string(),
        ingest,
        overview: session.summary(),
    })
}
