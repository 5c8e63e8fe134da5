use crate::driver::Driver;
use std::path::PathBuf;
use usagescope_api::{PositionContext, SearchTarget};
use usagescope_core::{Invocation, UserAction};

/// What the one-shot command does once the popup shows its results.
#[derive(Debug, Clone, Default)]
pub struct ShowArgs {
    pub root: PathBuf,
    pub file: Option<PathBuf>,
    pub line: usize,
    pub col: usize,
    pub name: Option<String>,
    pub pick: Option<usize>,
    /// Open this row instead of closing the popup.
    pub choose: Option<usize>,
    /// Follow the "more usages" row this many times first.
    pub more: usize,
    pub json: bool,
}

pub async fn run(args: ShowArgs) -> anyhow::Result<()> {
    let invocation = match (&args.name, &args.file) {
        (Some(name), _) => Invocation::Target(SearchTarget::new(name.clone())),
        (None, Some(file)) => Invocation::At(PositionContext::new(
            file.clone(),
            args.line.saturating_sub(1),
            args.col.saturating_sub(1),
        )),
        (None, None) => anyhow::bail!("give a file position or --name"),
    };

    let mut driver = Driver::new(args.root.clone(), None, args.json);
    driver.host().stage_pick(args.pick);
    driver.start(invocation).await;

    for _ in 0..args.more {
        let Some(row) = driver.more_row() else { break };
        driver.dispatch(UserAction::Choose(Some(row))).await;
    }

    if driver.popup().is_some() {
        let action = match args.choose {
            Some(row) => UserAction::Choose(Some(row)),
            None => UserAction::Close,
        };
        driver.dispatch(action).await;
    }
    Ok(())
}
