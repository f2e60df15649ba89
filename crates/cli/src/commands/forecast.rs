use clap::ValueEnum;
use tailor_core::config::LoadOptions;
use tailor_core::AnalyticsError;

use super::{load_session, CommandResult, Reply};

pub const NAME: &str = "forecast";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    #[default]
    Backtest,
    Future,
}

/// Which items to forecast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Item(String),
    All,
}

pub fn run(options: &LoadOptions, target: &Target, mode: Mode, periods: Option<usize>) -> CommandResult {
    CommandResult::from_outcome(NAME, execute(options, target, mode, periods))
}

fn execute(
    options: &LoadOptions,
    target: &Target,
    mode: Mode,
    periods: Option<usize>,
) -> anyhow::Result<Reply> {
    let (session, _) = load_session(options)?;
    let horizon = periods.unwrap_or(session.config().forecast.default_horizon);

    match (target, mode) {
        (Target::All, Mode::Backtest) => Reply::data(session.backtest_all()),
        (Target::All, Mode::Future) => {
            Reply::data(session.forecast_all(horizon).map_err(AnalyticsError::from)?)
        }
        (Target::Item(query), Mode::Backtest) => match session.backtest(query) {
            Some(outcome) => Reply::data(outcome),
            None => Ok(Reply::miss(format!("no sales history for `{query}`"))),
        },
        (Target::Item(query), Mode::Future) => {
            match session.forecast(query, horizon).map_err(AnalyticsError::from)? {
                Some(outcome) => Reply::data(outcome),
                None => Ok(Reply::miss(format!("no sales history for `{query}`"))),
            }
        }
    }
}
