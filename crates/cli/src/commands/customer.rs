use serde::Serialize;
use tailor_core::config::LoadOptions;
use tailor_core::customers::{self, ReviewPoint};
use tailor_core::Transaction;

use super::{load_session, CommandResult, Reply};

pub const NAME: &str = "customer";

#[derive(Debug, Serialize)]
struct CustomerInsights<'a> {
    customer_id: &'a str,
    purchases: Vec<&'a Transaction>,
    review_trend: Vec<ReviewPoint>,
}

pub fn run(options: &LoadOptions, customer_id: &str) -> CommandResult {
    CommandResult::from_outcome(NAME, execute(options, customer_id))
}

fn execute(options: &LoadOptions, customer_id: &str) -> anyhow::Result<Reply> {
    let (session, _) = load_session(options)?;
    let customer_id = customer_id.trim();

    let purchases = session.customer_history(customer_id);
    if purchases.is_empty() {
        return Ok(Reply::miss(format!("no purchases recorded for customer `{customer_id}`")));
    }
    let review_trend = customers::review_trend(&purchases);
    Reply::data(CustomerInsights { customer_id, purchases, review_trend })
}
