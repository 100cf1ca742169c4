use std::io::IsTerminal as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use csv::ReaderBuilder;
use csv::Trim;
use tracing_subscriber::EnvFilter;
use vaultledger::clock::ManualClock;
use vaultledger::command::ScheduledCommand;
use vaultledger::config::DEFAULT_BANK_CAP;
use vaultledger::config::DEFAULT_WITHDRAWAL_COOLDOWN_SECS;
use vaultledger::config::InterestRate;
use vaultledger::config::LedgerConfig;
use vaultledger::engine::LedgerEngine;
use vaultledger::notification::TracingNotificationSink;
use vaultledger::payment::LoggingPaymentSender;
use vaultledger::units::AccountId;
use vaultledger::units::Amount;
use vaultledger::units::Timestamp;

mod csv_report;

/// Replays timestamped ledger commands from a CSV file and prints the resulting accounts.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// CSV file with `command,caller,amount,timestamp` rows.
    commands_csv: PathBuf,
    /// Identity allowed to run administrative commands.
    #[arg(long, default_value_t = AccountId(0))]
    owner: AccountId,
    /// Maximum amount of a single `withdraw`.
    #[arg(long, default_value_t = Amount(1_000))]
    withdrawal_limit: Amount,
    /// Maximum total balance the pool may hold.
    #[arg(long, default_value_t = DEFAULT_BANK_CAP)]
    bank_cap: Amount,
    /// Minimum number of seconds between two withdrawals of the same account.
    #[arg(long, default_value_t = DEFAULT_WITHDRAWAL_COOLDOWN_SECS)]
    withdrawal_cooldown_secs: u64,
    /// Annual simple-interest rate as a fraction, e.g. `0.05`.
    #[arg(long, default_value_t = InterestRate::default())]
    interest_rate: InterestRate,
}

fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let config = LedgerConfig {
        bank_cap: cli.bank_cap,
        withdrawal_limit: cli.withdrawal_limit,
        withdrawal_cooldown_secs: cli.withdrawal_cooldown_secs,
        interest_rate: cli.interest_rate,
    };

    let clock = ManualClock::new(Timestamp(0));
    let engine = LedgerEngine::new(
        cli.owner,
        config,
        clock.clone(),
        LoggingPaymentSender,
        TracingNotificationSink,
    );

    let mut commands_reader = ReaderBuilder::new().trim(Trim::All).from_path(&cli.commands_csv)?;

    let mut has_errors = false;
    for command_res in commands_reader.deserialize::<ScheduledCommand>() {
        let command = match command_res {
            Ok(command) => command,
            Err(error) => {
                tracing::error!("failed to deserialize command, error={error}");
                has_errors = true;
                continue;
            }
        };

        match command.apply(&engine, &clock) {
            Ok(outcome) => tracing::debug!(%command, %outcome, "command applied"),
            Err(error) => {
                tracing::error!("failed to apply command, command=({command}), error={error}");
                has_errors = true;
            }
        }
    }

    let bank_stats = engine.bank_stats();
    tracing::info!(
        total_bank_balance = %bank_stats.total_bank_balance,
        total_deposits_count = bank_stats.total_deposits_count,
        total_withdrawals_count = bank_stats.total_withdrawals_count,
        remaining_capacity = %bank_stats.remaining_capacity,
        pool_funds = %engine.pool_funds(),
        "replay completed"
    );

    let accounts = engine.accounts();
    let report_errors = csv_report::write_to_stdout(&accounts);
    for error in &report_errors {
        tracing::error!("failed to write report, error={error}");
    }

    if has_errors || !report_errors.is_empty() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}
