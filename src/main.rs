mod config;
mod report;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use config::{CliConfig, Config, Report};
use report::{AcceptedRecord, LedgerRecord};
use scenario::Scenario;
use std::io;
use tracing::info;
use tx_handler::TxHandler;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = CliConfig::parse();

    process_scenario(&config, io::stdout().lock())?;

    info!("Processing completed successfully");

    Ok(())
}

fn process_scenario<C: Config, W: io::Write>(config: &C, out: W) -> Result<()> {
    let scenario = Scenario::from_path(config.input_path())?;

    info!(
        "Loaded {} genesis entries and {} rounds",
        scenario.genesis.len(),
        scenario.rounds.len()
    );

    let mut handler = TxHandler::new(&scenario.genesis).with_policy(config.policy());

    let mut writer = csv::WriterBuilder::new().from_writer(out);

    let mut total_accepted = 0;

    for (round, batch) in &scenario.rounds {
        let outcome = handler.process_round_detailed(batch);
        total_accepted += outcome.accepted.len();

        info!(
            "Round {round}: accepted {} of {} candidates, fees {}",
            outcome.accepted.len(),
            batch.len(),
            outcome.total_fees()
        );

        if config.report() == Report::Accepted {
            for accepted in &outcome.accepted {
                writer
                    .serialize(AcceptedRecord::new(*round, accepted, &scenario))
                    .context("Failed to serialize accepted transaction")?;
            }
        }
    }

    info!(
        "Accepted {total_accepted} transactions, {} entries remain",
        handler.entries().len()
    );

    if config.report() == Report::Ledger {
        let mut entries: Vec<_> = handler.entries().iter().collect();
        entries.sort_by_key(|(outpoint, _)| **outpoint);

        for (outpoint, output) in entries {
            writer
                .serialize(LedgerRecord::new(outpoint, output, &scenario))
                .context("Failed to serialize entry")?;
        }
    }

    writer.flush().context("Failed to flush report")?;

    Ok(())
}
