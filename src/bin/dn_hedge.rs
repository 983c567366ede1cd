use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dn_hedge_log::{
    utils, BinanceOptionsClient, Config, DeltaSource, HedgeCalculator, HedgeError, ManualEntry,
    MockDeltaSource, NewPosition, OptionType, RehedgeDecision, SessionController, StoreFile,
};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// Track delta-neutral option hedges and get rehedge suggestions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to $CONFIG_FILE or config/dn_hedge.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding positions.json (overrides general.data_dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new option position and its starting hedge
    New {
        /// Expiry token, e.g. 29MAR
        #[arg(long)]
        expiry: String,

        /// call or put
        #[arg(long = "type")]
        option_type: OptionType,

        #[arg(long)]
        strike: Decimal,

        /// Contracts (underlying units)
        #[arg(long)]
        size: Decimal,

        /// Absolute delta at entry, 0.0 - 1.0
        #[arg(long)]
        entry_delta: Decimal,

        /// Rehedge threshold in underlying units (defaults to hedge.default_band)
        #[arg(long)]
        band: Option<Decimal>,

        /// Underlying symbol (defaults to general.underlying_symbol)
        #[arg(long)]
        symbol: Option<String>,

        /// Skip the "did you execute" confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Enter or fetch the current delta and check the band
    Check {
        /// Position id (contract name)
        id: String,

        /// Observed delta; skips the delta source
        #[arg(long)]
        delta: Option<Decimal>,

        #[arg(long, value_enum, default_value_t = SourceKind::Manual)]
        source: SourceKind,

        /// Apply a suggested rehedge without asking
        #[arg(long)]
        yes: bool,
    },

    /// Close a position and move it to history
    Close {
        id: String,
    },

    /// Show active positions
    List,

    /// Show closed positions
    History,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    Manual,
    Live,
    Mock,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_layered(path)?,
        None => Config::load()?,
    };
    utils::init_from_config(&config.logging)?;

    let mut session = match &args.data_dir {
        Some(dir) => SessionController::open(
            StoreFile::in_dir(dir),
            HedgeCalculator::new(config.hedge.convention),
            config.exchange.timeout(),
        )?,
        None => SessionController::from_config(&config)?,
    };

    match args.command {
        Some(Command::New { expiry, option_type, strike, size, entry_delta, band, symbol, yes }) => {
            let params = NewPosition {
                underlying_symbol: symbol.unwrap_or_else(|| config.general.underlying_symbol.clone()),
                expiry,
                option_type,
                strike,
                size,
                entry_delta,
                band: band.unwrap_or(config.hedge.default_band),
            };
            new_position(&mut session, params, yes)?;
        }
        Some(Command::Check { id, delta, source, yes }) => {
            check_position(&mut session, &config, &id, delta, source, yes).await?;
        }
        Some(Command::Close { id }) => {
            close_position(&mut session, &id)?;
        }
        Some(Command::List) => print_active(&session),
        Some(Command::History) => print_history(&session),
        None => interactive(&mut session, &config).await?,
    }

    // every mutation has already been saved by the session
    Ok(())
}

/// Show the starting hedge, ask for confirmation, then save
fn new_position(session: &mut SessionController, params: NewPosition, yes: bool) -> Result<()> {
    let params = params.validate()?;
    let starting_hedge = session
        .calculator()
        .starting_hedge(params.entry_delta, params.option_type, params.size)?;

    println!();
    println!("Calculated starting hedge ({})", session.calculator().convention());
    println!("   Exposure: {} {}", (params.entry_delta * params.size).normalize(), params.underlying_symbol);
    println!("   Action:   {}", describe_hedge(starting_hedge, &params.underlying_symbol));

    if !yes && !prompt_yes("Did you execute this hedge? (y/n): ")? {
        println!("Setup cancelled.");
        return Ok(());
    }

    let position = session.create_position(params)?;
    println!("Saved {}", position.contract_name);
    Ok(())
}

async fn check_position(
    session: &mut SessionController,
    config: &Config,
    id: &str,
    delta: Option<Decimal>,
    source: SourceKind,
    yes: bool,
) -> Result<()> {
    let position = session.position(id)?.clone();
    println!();
    println!("Check status: {} ({})", position.contract_name, position.contract.option_type);
    println!(
        "   Size: {} | Band: {} | Last delta: {}",
        position.size, position.band, position.last_delta
    );

    let decision = match delta {
        Some(delta) => session.update_delta(id, delta)?,
        None => refresh(session, config, id, source).await?,
    };
    print_decision(&decision);

    if decision.is_rehedge() && (yes || prompt_yes("Did you execute this hedge? (y/n): ")?) {
        let position = session.apply_rehedge(id)?;
        println!("Hedge updated to {}. Back to neutral.", position.current_hedge);
    } else if !decision.is_rehedge() {
        println!("Inside the band. Do nothing.");
    }
    Ok(())
}

/// Pull a delta from the chosen source; a failed live fetch falls back to manual entry
async fn refresh(
    session: &mut SessionController,
    config: &Config,
    id: &str,
    source: SourceKind,
) -> Result<RehedgeDecision> {
    let manual = ManualEntry::stdio();

    let primary: Box<dyn DeltaSource> = match source {
        SourceKind::Manual => return Ok(session.refresh_delta(id, &manual).await?),
        SourceKind::Mock => Box::new(MockDeltaSource::new(config.exchange.mock_spot_price)),
        SourceKind::Live => Box::new(BinanceOptionsClient::new(
            config.exchange.api_endpoint.clone(),
            config.exchange.timeout(),
            config.exchange.expiry_year,
        )?),
    };

    match session.refresh_delta(id, primary.as_ref()).await {
        Err(HedgeError::Unavailable(e)) => {
            println!("Fetch failed ({}). Enter the delta manually.", e);
            Ok(session.refresh_delta(id, &manual).await?)
        }
        other => Ok(other?),
    }
}

fn close_position(session: &mut SessionController, id: &str) -> Result<()> {
    let entry = session.close_position(id)?;
    println!(
        "Closed {} at {} with hedge {} after {} rehedges",
        entry.position.contract_name,
        entry.closed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        entry.position.current_hedge,
        entry.position.rehedge_count
    );
    Ok(())
}

fn print_decision(decision: &RehedgeDecision) {
    println!();
    println!("   Target hedge:  {}", decision.target_hedge);
    println!("   Current hedge: {}", decision.current_hedge);
    println!("   Deviation:     {}", decision.deviation);
    println!("   Decision:      {}", decision);
}

fn describe_hedge(hedge: Decimal, symbol: &str) -> String {
    if hedge > Decimal::ZERO {
        format!("open LONG {} {}", hedge.normalize(), symbol)
    } else if hedge < Decimal::ZERO {
        format!("open SHORT {} {}", hedge.abs().normalize(), symbol)
    } else {
        "no hedge".to_string()
    }
}

fn print_active(session: &SessionController) {
    let rows = session.summaries();
    if rows.is_empty() {
        println!("No active positions.");
        return;
    }

    println!(
        "{:<24} {:>5} {:>8} {:>8} {:>10} {:>12} {:>12} {:>8} {:>4}",
        "CONTRACT", "TYPE", "SIZE", "BAND", "LAST Δ", "HELD", "TARGET", "STATUS", "#RH"
    );
    for row in rows {
        println!(
            "{:<24} {:>5} {:>8} {:>8} {:>10} {:>12} {:>12} {:>8} {:>4}",
            row.contract_name,
            row.option_type,
            row.size.normalize(),
            row.band.normalize(),
            row.last_delta.normalize(),
            row.current_hedge.normalize(),
            row.target_hedge.normalize(),
            row.trigger,
            row.rehedge_count
        );
    }
    println!("Net hedge: {}", session.net_hedge().normalize());
}

fn print_history(session: &SessionController) {
    let history = session.history();
    if history.is_empty() {
        println!("No closed positions.");
        return;
    }

    for entry in history {
        println!(
            "{:<24} opened {} closed {} final hedge {} rehedges {}",
            entry.position.contract_name,
            entry.position.created_at.format("%Y-%m-%d %H:%M"),
            entry.closed_at.format("%Y-%m-%d %H:%M"),
            entry.position.current_hedge.normalize(),
            entry.position.rehedge_count
        );
    }
}

/// Menu loop until the user exits or stdin closes
async fn interactive(session: &mut SessionController, config: &Config) -> Result<()> {
    info!("Interactive session started");

    loop {
        println!();
        println!("..............................");
        if session.active_positions().is_empty() {
            println!("NO ACTIVE POSITIONS");
        } else {
            for pos in session.active_positions() {
                println!("ACTIVE: {} | last delta {}", pos.contract_name, pos.last_delta);
            }
        }
        println!("1. New position");
        println!("2. Update / check delta");
        println!("3. Close position");
        println!("4. List");
        println!("5. History");
        println!("6. Exit");

        let Some(choice) = prompt("Select: ")? else {
            return Ok(());
        };

        let outcome = match choice.as_str() {
            "1" => interactive_new(session, config),
            "2" => match pick_position(session)? {
                Some(id) => {
                    let source = if prompt_yes("Fetch live delta? (y/n): ")? {
                        SourceKind::Live
                    } else {
                        SourceKind::Manual
                    };
                    check_position(session, config, &id, None, source, false).await
                }
                None => Ok(()),
            },
            "3" => match pick_position(session)? {
                Some(id) if prompt_yes(&format!("Close {}? (y/n): ", id))? => close_position(session, &id),
                _ => Ok(()),
            },
            "4" => {
                print_active(session);
                Ok(())
            }
            "5" => {
                print_history(session);
                Ok(())
            }
            "6" | "q" => return Ok(()),
            _ => {
                println!("Invalid selection.");
                Ok(())
            }
        };

        // recoverable: report and show the menu again
        if let Err(e) = outcome {
            println!("Error: {:#}", e);
        }
    }
}

fn interactive_new(session: &mut SessionController, config: &Config) -> Result<()> {
    println!();
    println!("NEW POSITION");

    let Some(expiry) = prompt("Expiry (e.g. 29MAR): ")? else { return Ok(()) };
    let option_type = loop {
        let Some(raw) = prompt("Type (call/put): ")? else { return Ok(()) };
        match OptionType::from_str(&raw) {
            Ok(option_type) => break option_type,
            Err(e) => println!("{}", e),
        }
    };
    let Some(strike) = prompt_decimal("Strike price: ")? else { return Ok(()) };
    let band_label = format!("Band (rehedge threshold, blank = {}): ", config.hedge.default_band);
    let band = match prompt(&band_label)? {
        Some(raw) if raw.is_empty() => config.hedge.default_band,
        Some(raw) => Decimal::from_str(&raw).context("band")?,
        None => return Ok(()),
    };
    let Some(entry_delta) = prompt_decimal("Entry delta (0.0 to 1.0): ")? else { return Ok(()) };
    let Some(size) = prompt_decimal("Size (contracts): ")? else { return Ok(()) };

    let params = NewPosition {
        underlying_symbol: config.general.underlying_symbol.clone(),
        expiry,
        option_type,
        strike,
        size,
        entry_delta,
        band,
    };
    new_position(session, params, false)
}

fn pick_position(session: &SessionController) -> Result<Option<String>> {
    let ids: Vec<String> = session
        .active_positions()
        .iter()
        .map(|p| p.contract_name.clone())
        .collect();

    match ids.len() {
        0 => {
            println!("No active positions.");
            Ok(None)
        }
        1 => Ok(Some(ids[0].clone())),
        _ => {
            for (i, id) in ids.iter().enumerate() {
                println!("  {}. {}", i + 1, id);
            }
            let Some(raw) = prompt("Position number: ")? else { return Ok(None) };
            match raw.parse::<usize>().ok().and_then(|n| ids.get(n.wrapping_sub(1))) {
                Some(id) => Ok(Some(id.clone())),
                None => {
                    println!("Invalid selection.");
                    Ok(None)
                }
            }
        }
    }
}

/// Read one trimmed line; `None` once stdin is closed
fn prompt(label: &str) -> Result<Option<String>> {
    print!("{}", label);
    std::io::stdout().flush()?;

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt_decimal(label: &str) -> Result<Option<Decimal>> {
    loop {
        let Some(raw) = prompt(label)? else { return Ok(None) };
        match Decimal::from_str(&raw) {
            Ok(value) => return Ok(Some(value)),
            Err(_) => println!("Invalid number. Try again."),
        }
    }
}

fn prompt_yes(label: &str) -> Result<bool> {
    Ok(matches!(prompt(label)?.as_deref(), Some("y") | Some("Y") | Some("yes")))
}
