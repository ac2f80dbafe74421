use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pawnbank_core::{
    format_units, parse_units, AccountId, Amount, AssetCustody, AssetRef, BankConfig, CallContext,
    Clock, LoanError, LoanId, SystemClock, Timestamp,
};
use serde::Serialize;
use tracing::info;

mod store;
mod telemetry;

use store::StateFile;

#[derive(Parser)]
#[command(name = "pawnbank", version, about = "NFT-collateralized lending ledger")]
struct Cli {
    /// Ledger state file.
    #[arg(long, global = true, default_value = "pawnbank.json")]
    state: PathBuf,

    /// Override the clock (unix seconds).
    #[arg(long, global = true)]
    now: Option<Timestamp>,

    /// Log filter when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct Caller {
    /// Identity performing the call.
    #[arg(long)]
    caller: AccountId,
}

#[derive(Args, Clone)]
struct Asset {
    #[arg(long)]
    contract: String,
    #[arg(long)]
    token_id: u64,
}

impl From<Asset> for AssetRef {
    fn from(a: Asset) -> Self {
        AssetRef::new(a.contract, a.token_id)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty ledger state file.
    Init {
        /// JSON config (settlement_buffer_secs, rate_basis, escrow_account).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overwrite an existing state file.
        #[arg(long)]
        force: bool,
    },
    /// Credit an account with external value.
    Fund {
        #[arg(long)]
        account: AccountId,
        #[arg(long, value_parser = parse_amount)]
        amount: Amount,
    },
    /// Register an asset held by an account.
    Mint {
        #[arg(long)]
        to: AccountId,
        #[command(flatten)]
        asset: Asset,
    },
    /// Pledge an asset and open a loan.
    Create {
        #[command(flatten)]
        caller: Caller,
        #[command(flatten)]
        asset: Asset,
        /// Whole percent.
        #[arg(long)]
        rate: u32,
        #[arg(long, value_parser = parse_amount)]
        max: Amount,
        /// Absolute expiry (unix seconds).
        #[arg(long, conflicts_with = "duration", required_unless_present = "duration")]
        complete_at: Option<Timestamp>,
        /// Expiry relative to now, in seconds.
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Bid on a loan.
    Underwrite {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        loan: LoanId,
        /// Exact value to attach.
        #[arg(long, value_parser = parse_amount, conflicts_with = "raise_to", required_unless_present = "raise_to")]
        value: Option<Amount>,
        /// Raise the loan to this amount, attaching buffered interest as needed.
        #[arg(long, value_parser = parse_amount)]
        raise_to: Option<Amount>,
    },
    /// Draw available capital (owner only).
    Draw {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        loan: LoanId,
    },
    /// Repay a loan; defaults to the buffered quote, excess is refunded.
    Repay {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        loan: LoanId,
        #[arg(long, value_parser = parse_amount)]
        value: Option<Amount>,
    },
    /// Cancel an unbid loan (owner only).
    Cancel {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        loan: LoanId,
    },
    /// Hand an expired loan's asset to its lender.
    Seize {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        loan: LoanId,
    },
    /// Show one loan with its interest projections.
    Show {
        #[arg(long)]
        loan: LoanId,
        /// Seconds into the future to project interest.
        #[arg(long, default_value_t = 0)]
        future: u64,
    },
    /// List every loan.
    List,
    /// Values to attach for underwriting or repaying, buffered for settlement delay.
    Quote {
        #[arg(long)]
        loan: LoanId,
        #[arg(long, value_parser = parse_amount)]
        raise_to: Option<Amount>,
    },
    /// Balance of an account.
    Balance {
        #[arg(long)]
        account: AccountId,
    },
    /// Event log, optionally for one loan.
    Events {
        #[arg(long)]
        loan: Option<LoanId>,
    },
    /// State root over the loan book.
    Snapshot,
}

fn parse_amount(s: &str) -> Result<Amount, String> {
    parse_units(s).map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct LoanView<'a> {
    id: LoanId,
    #[serde(flatten)]
    loan: &'a pawnbank_core::LoanRecord,
    asset_holder: Option<AccountId>,
    interest_accrued: String,
    total_interest: String,
    required_repayment: String,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("encode output")?);
    Ok(())
}

fn ctx(caller: Caller, now: Timestamp) -> CallContext {
    CallContext::new(caller.caller, now)
}

fn run(cli: Cli) -> Result<()> {
    let now = cli.now.unwrap_or_else(|| SystemClock.now());
    let path = cli.state;

    if let Command::Init { config, force } = &cli.command {
        if path.exists() && !force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }
        let config = match config {
            Some(p) => store::read_config(p)?,
            None => BankConfig::default(),
        };
        store::save(&path, &StateFile::fresh(config))?;
        println!("initialised → {}", path.display());
        return Ok(());
    }

    let mut state = store::load(&path)?;
    let bank = &mut state.bank;
    let mut dirty = true;

    match cli.command {
        Command::Init { .. } => unreachable!("handled above"),
        Command::Fund { account, amount } => {
            bank.settlement_mut().credit_account(&account, amount)?;
            info!(%account, amount = %amount, "account funded");
            println!("{} ← {}", account, format_units(amount));
        }
        Command::Mint { to, asset } => {
            let asset = AssetRef::from(asset);
            println!("{} held by {}", asset, to);
            bank.settlement_mut().mint(asset, to);
        }
        Command::Create {
            caller,
            asset,
            rate,
            max,
            complete_at,
            duration,
        } => {
            let complete_at = match (complete_at, duration) {
                (Some(t), _) => t,
                (None, Some(d)) => now.saturating_add(d),
                (None, None) => unreachable!("clap requires one of --complete-at/--duration"),
            };
            let id = bank.create(&ctx(caller, now), asset.into(), rate, max, complete_at)?;
            println!("loan {} created, expires at {}", id, complete_at);
        }
        Command::Underwrite {
            caller,
            loan,
            value,
            raise_to,
        } => {
            let value = match (value, raise_to) {
                (Some(v), _) => v,
                (None, Some(target)) => bank.quote_underwrite(loan, target, now)?,
                (None, None) => unreachable!("clap requires one of --value/--raise-to"),
            };
            let amount = bank.underwrite(&ctx(caller, now), loan, value)?;
            println!(
                "loan {} underwritten: attached {}, loan amount {}",
                loan,
                format_units(value),
                format_units(amount)
            );
        }
        Command::Draw { caller, loan } => {
            let drawn = bank.draw(&ctx(caller, now), loan)?;
            println!("loan {} drawn: {}", loan, format_units(drawn));
        }
        Command::Repay { caller, loan, value } => {
            let value = match value {
                Some(v) => v,
                None => bank.quote_repayment(loan, now)?,
            };
            let repayment = bank.repay(&ctx(caller, now), loan, value)?;
            println!(
                "loan {} repaid: lender {}, refunded {}, released to owner {}",
                loan,
                format_units(repayment.paid_to_lender),
                format_units(repayment.refunded),
                format_units(repayment.released_to_owner)
            );
        }
        Command::Cancel { caller, loan } => {
            bank.cancel(&ctx(caller, now), loan)?;
            println!("loan {} cancelled", loan);
        }
        Command::Seize { caller, loan } => {
            bank.seize(&ctx(caller, now), loan)?;
            println!("loan {} seized", loan);
        }
        Command::Show { loan, future } => {
            dirty = false;
            let record = bank.loan(loan)?;
            print_json(&LoanView {
                id: loan,
                loan: record,
                asset_holder: bank.settlement().owner_of(&record.asset),
                interest_accrued: format_units(bank.interest_accrued(loan, now, future)?),
                total_interest: format_units(bank.total_interest(loan, now, future)?),
                required_repayment: format_units(bank.required_repayment(loan, now, future)?),
            })?;
        }
        Command::List => {
            dirty = false;
            for (id, loan) in bank.loans().iter().enumerate() {
                let status = match (&loan.token_owner, &loan.lender) {
                    (None, _) => "closed",
                    (Some(_), None) => "open",
                    (Some(_), Some(_)) if loan.is_expired(now) => "expired",
                    (Some(_), Some(_)) => "funded",
                };
                println!(
                    "{:>4}  {:<8} {:<24} {:>3}%  {} / {}",
                    id,
                    status,
                    loan.asset.to_string(),
                    loan.interest_rate,
                    format_units(loan.loan_amount),
                    format_units(loan.max_loan_amount)
                );
            }
        }
        Command::Quote { loan, raise_to } => {
            dirty = false;
            let record = bank.loan(loan)?;
            let raise_to = raise_to.unwrap_or(record.loan_amount);
            println!(
                "underwrite to {}: attach {}",
                format_units(raise_to),
                format_units(bank.quote_underwrite(loan, raise_to, now)?)
            );
            println!("repay: attach {}", format_units(bank.quote_repayment(loan, now)?));
        }
        Command::Balance { account } => {
            dirty = false;
            println!("{}", format_units(bank.settlement().balance_of(&account)));
        }
        Command::Events { loan } => {
            dirty = false;
            let events: Vec<_> = match loan {
                Some(id) => bank.events_for(id).collect(),
                None => bank.events().iter().collect(),
            };
            print_json(&events)?;
        }
        Command::Snapshot => {
            dirty = false;
            let snapshot = bank.snapshot(now);
            print_json(&serde_json::json!({
                "taken_at": snapshot.taken_at,
                "loans": snapshot.loans.len(),
                "events": snapshot.event_count,
                "state_root": snapshot.root_hex(),
            }))?;
        }
    }

    if dirty {
        store::save(&path, &state)?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = telemetry::init_tracing(&cli.log_level, cli.log_json) {
        eprintln!("warning: logging disabled: {err:#}");
    }
    if let Err(err) = run(cli) {
        match err.downcast_ref::<LoanError>() {
            Some(loan_err) => eprintln!("error: {} ({})", loan_err, loan_err.code()),
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}
