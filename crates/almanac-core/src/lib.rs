pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod h5;
pub mod html5;
pub mod locale;
pub mod markup;

use std::ffi::OsString;

use clap::Parser;
use tracing::{
  debug,
  info
};

pub use calendar::{
  Calendar,
  CalendarOptions,
  DateSpan
};
pub use error::CalendarError;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting almanac"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.almanacrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  commands::dispatch(
    &cfg,
    cli.command
  )?;

  info!("done");
  Ok(())
}
