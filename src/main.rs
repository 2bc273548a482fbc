//! BinanceFuturesBot - Main Entry Point
//!
//! A CLI trading bot for Binance USDT-M Futures supporting market, limit,
//! stop-limit, OCO, TWAP, and grid order strategies.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use binance_futures_bot::common::cancel::CancelToken;
use binance_futures_bot::common::errors::{BotError, Result};
use binance_futures_bot::common::traits::ExchangeGateway;
use binance_futures_bot::common::types::{
    OrderRecord, OrderSpec, PositionSide, Side, TimeInForce, WorkingType,
};
use binance_futures_bot::config::types::ApiCredentials;
use binance_futures_bot::config::{load_config, AppConfig};
use binance_futures_bot::strategy::{
    GridManager, GridParams, GridReport, GridState, LevelOutcome, OcoConfig, OcoMonitor,
    OcoOutcome, OcoParams, SliceOutcome, TwapParams, TwapReport, TwapScheduler,
};
use binance_futures_bot::{BinanceRestClient, OrderSubmitter};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a market order
    Market {
        /// Trading pair symbol (e.g. BTCUSDT)
        symbol: String,
        /// Order side (BUY or SELL)
        #[arg(value_parser = parse_side)]
        side: Side,
        /// Order quantity
        quantity: Decimal,
        /// Order will only reduce an existing position
        #[arg(long)]
        reduce_only: bool,
    },
    /// Place a limit order
    Limit {
        /// Trading pair symbol (e.g. BTCUSDT)
        symbol: String,
        /// Order side (BUY or SELL)
        #[arg(value_parser = parse_side)]
        side: Side,
        /// Order quantity
        quantity: Decimal,
        /// Limit price
        price: Decimal,
        /// Time in force (GTC, IOC, FOK, GTX)
        #[arg(long, default_value = "GTC", value_parser = parse_time_in_force)]
        time_in_force: TimeInForce,
        /// Maker-only order (sets time in force to GTX)
        #[arg(long)]
        post_only: bool,
        /// Order will only reduce an existing position
        #[arg(long)]
        reduce_only: bool,
    },
    /// Place a stop-limit order
    StopLimit {
        /// Trading pair symbol (e.g. BTCUSDT)
        symbol: String,
        /// Order side (BUY or SELL)
        #[arg(value_parser = parse_side)]
        side: Side,
        /// Order quantity
        quantity: Decimal,
        /// Stop/trigger price
        stop_price: Decimal,
        /// Limit price after trigger
        limit_price: Decimal,
        /// Order will only reduce an existing position
        #[arg(long)]
        reduce_only: bool,
        /// Price basis for the stop trigger (CONTRACT_PRICE or MARK_PRICE)
        #[arg(long, default_value = "CONTRACT_PRICE", value_parser = parse_working_type)]
        working_type: WorkingType,
    },
    /// Place a supervised take-profit / stop-loss pair
    Oco {
        /// Trading pair symbol (e.g. BTCUSDT)
        symbol: String,
        /// Position side to close (LONG or SHORT)
        #[arg(value_parser = parse_position_side)]
        position_side: PositionSide,
        /// Order quantity
        quantity: Decimal,
        /// Take profit price
        take_profit_price: Decimal,
        /// Stop loss price
        stop_loss_price: Decimal,
    },
    /// Execute a TWAP strategy
    Twap {
        /// Trading pair symbol (e.g. BTCUSDT)
        symbol: String,
        /// Order side (BUY or SELL)
        #[arg(value_parser = parse_side)]
        side: Side,
        /// Total quantity to execute
        total_quantity: Decimal,
        /// Number of slices
        slice_count: u32,
        /// Seconds between slices
        interval_seconds: u64,
        /// Randomize slice sizes
        #[arg(long)]
        randomize: bool,
        /// Simulate without placing orders
        #[arg(long)]
        dry_run: bool,
    },
    /// Set up a grid trading ladder
    Grid {
        /// Trading pair symbol (e.g. BTCUSDT)
        symbol: String,
        /// Lower bound of the price range
        lower_price: Option<Decimal>,
        /// Upper bound of the price range
        upper_price: Option<Decimal>,
        /// Number of grid levels
        level_count: Option<u32>,
        /// Quantity for each grid order
        quantity_per_level: Option<Decimal>,
        /// Simulate without placing orders
        #[arg(long)]
        dry_run: bool,
        /// Cancel all open orders for the symbol instead of placing a grid
        #[arg(long)]
        cancel_all: bool,
        /// Place an order at a level equal to the current price instead of
        /// skipping it
        #[arg(long)]
        include_reference_level: bool,
    },
}

fn parse_side(s: &str) -> std::result::Result<Side, String> {
    match s.to_uppercase().as_str() {
        "BUY" => Ok(Side::Buy),
        "SELL" => Ok(Side::Sell),
        other => Err(format!("invalid side {}, expected BUY or SELL", other)),
    }
}

fn parse_position_side(s: &str) -> std::result::Result<PositionSide, String> {
    match s.to_uppercase().as_str() {
        "LONG" => Ok(PositionSide::Long),
        "SHORT" => Ok(PositionSide::Short),
        other => Err(format!(
            "invalid position side {}, expected LONG or SHORT",
            other
        )),
    }
}

fn parse_time_in_force(s: &str) -> std::result::Result<TimeInForce, String> {
    match s.to_uppercase().as_str() {
        "GTC" => Ok(TimeInForce::Gtc),
        "IOC" => Ok(TimeInForce::Ioc),
        "FOK" => Ok(TimeInForce::Fok),
        "GTX" => Ok(TimeInForce::Gtx),
        other => Err(format!(
            "invalid time in force {}, expected GTC, IOC, FOK, or GTX",
            other
        )),
    }
}

fn parse_working_type(s: &str) -> std::result::Result<WorkingType, String> {
    match s.to_uppercase().as_str() {
        "CONTRACT_PRICE" => Ok(WorkingType::ContractPrice),
        "MARK_PRICE" => Ok(WorkingType::MarkPrice),
        other => Err(format!(
            "invalid working type {}, expected CONTRACT_PRICE or MARK_PRICE",
            other
        )),
    }
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    match run(args).await {
        Ok(()) => {}
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(args: Cli) -> Result<()> {
    init_logging(&args.log_level)?;

    info!("Starting BinanceFuturesBot");
    info!("Configuration file: {}", args.config);

    let config = load_config(Some(&args.config))?;
    let client = build_client(&config, &args.command)?;

    // Connectivity preflight; dry runs never touch order endpoints and may
    // proceed without it
    if !is_dry_run(&args.command) {
        let server_time = client.server_time().await?;
        info!("API connection successful. Server time: {}", server_time);
    }

    let cancel = CancelToken::new();
    spawn_ctrl_c_listener(cancel.clone());

    let submitter = OrderSubmitter::new(client);
    dispatch(args.command, &submitter, &config, cancel).await
}

fn init_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| BotError::Internal(e.to_string()))
}

fn build_client(config: &AppConfig, command: &Command) -> Result<BinanceRestClient> {
    let timeout = Duration::from_secs(config.settings.request_timeout_seconds);
    let mut client = BinanceRestClient::with_timeout(&config.binance.base_url(), timeout)?;

    if config.binance.has_credentials() {
        let credentials = ApiCredentials::new(
            config.binance.api_key.clone().unwrap_or_default(),
            config.binance.api_secret.clone().unwrap_or_default(),
        );
        client = client.with_credentials(credentials);
    } else if !is_dry_run(command) {
        return Err(BotError::Configuration(
            "API credentials not configured; set BINANCE_TESTNET_API_KEY and \
             BINANCE_TESTNET_SECRET_KEY (or their production equivalents)"
                .to_string(),
        ));
    }

    Ok(client)
}

fn is_dry_run(command: &Command) -> bool {
    match command {
        Command::Twap { dry_run, .. } => *dry_run,
        Command::Grid {
            dry_run,
            cancel_all,
            ..
        } => *dry_run && !cancel_all,
        _ => false,
    }
}

fn spawn_ctrl_c_listener(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal; finishing the current step");
            cancel.cancel();
        }
    });
}

async fn dispatch<G: ExchangeGateway>(
    command: Command,
    submitter: &OrderSubmitter<G>,
    config: &AppConfig,
    cancel: CancelToken,
) -> Result<()> {
    match command {
        Command::Market {
            symbol,
            side,
            quantity,
            reduce_only,
        } => {
            let spec = OrderSpec::market(symbol, side, quantity).with_reduce_only(reduce_only);
            let record = submitter.submit(&spec).await?;
            print_order_result("MARKET ORDER EXECUTED", &record);
        }

        Command::Limit {
            symbol,
            side,
            quantity,
            price,
            time_in_force,
            post_only,
            reduce_only,
        } => {
            let time_in_force = if post_only {
                TimeInForce::Gtx
            } else {
                time_in_force
            };
            let spec = OrderSpec::limit(symbol, side, quantity, price, time_in_force)
                .with_reduce_only(reduce_only);
            let record = submitter.submit(&spec).await?;
            print_order_result("LIMIT ORDER PLACED", &record);
        }

        Command::StopLimit {
            symbol,
            side,
            quantity,
            stop_price,
            limit_price,
            reduce_only,
            working_type,
        } => {
            let spec = OrderSpec::stop_limit(
                symbol,
                side,
                quantity,
                stop_price,
                limit_price,
                working_type,
            )
            .with_reduce_only(reduce_only);
            let record = submitter.submit(&spec).await?;
            print_order_result("STOP-LIMIT ORDER PLACED", &record);
            println!("Order will trigger when the market reaches the stop price");
        }

        Command::Oco {
            symbol,
            position_side,
            quantity,
            take_profit_price,
            stop_loss_price,
        } => {
            let oco_config = OcoConfig {
                poll_interval: Duration::from_secs(config.settings.poll_interval_seconds),
                monitor_budget: Duration::from_secs(config.settings.monitor_budget_seconds),
            };
            let monitor = OcoMonitor::new(submitter, oco_config).with_cancel_token(cancel);
            let report = monitor
                .run(OcoParams {
                    symbol,
                    position_side,
                    quantity,
                    take_profit_price,
                    stop_loss_price,
                })
                .await?;

            println!("\nOCO PAIR REPORT");
            println!(
                "  Take-profit order {}: {}",
                report.take_profit.order_id, report.take_profit.status
            );
            println!(
                "  Stop-loss order {}: {}",
                report.stop_loss.order_id, report.stop_loss.status
            );
            match report.outcome {
                OcoOutcome::Resolved { filled } => {
                    println!("  Outcome: {} leg filled, sibling cancelled", filled)
                }
                OcoOutcome::TimedOut => {
                    println!("  Outcome: monitoring budget exhausted, both legs remain open")
                }
                OcoOutcome::Interrupted => {
                    println!("  Outcome: interrupted, both legs remain open")
                }
            }
        }

        Command::Twap {
            symbol,
            side,
            total_quantity,
            slice_count,
            interval_seconds,
            randomize,
            dry_run,
        } => {
            let scheduler = TwapScheduler::new(submitter).with_cancel_token(cancel);
            let report = scheduler
                .run(TwapParams {
                    symbol,
                    side,
                    total_quantity,
                    slice_count,
                    interval: Duration::from_secs(interval_seconds),
                    randomize,
                    dry_run,
                })
                .await?;
            print_twap_report(&report);
        }

        Command::Grid {
            symbol,
            lower_price,
            upper_price,
            level_count,
            quantity_per_level,
            dry_run,
            cancel_all,
            include_reference_level,
        } => {
            let manager = GridManager::new(submitter);

            if cancel_all {
                let cancelled = manager.cancel_all_open(&symbol).await?;
                println!("\nCancelled {} orders for {}", cancelled, symbol);
                return Ok(());
            }

            let (lower_price, upper_price, level_count, quantity_per_level) =
                match (lower_price, upper_price, level_count, quantity_per_level) {
                    (Some(l), Some(u), Some(k), Some(q)) => (l, u, k, q),
                    _ => {
                        return Err(BotError::validation(
                            "grid",
                            "lower_price, upper_price, level_count, and quantity_per_level \
                             are required unless --cancel-all is given",
                        ))
                    }
                };

            let mut state = GridState::new();
            let report = manager
                .setup(
                    GridParams {
                        symbol,
                        lower_price,
                        upper_price,
                        level_count,
                        quantity_per_level,
                        skip_at_reference: !include_reference_level,
                        dry_run,
                    },
                    &mut state,
                )
                .await?;
            print_grid_report(&report);
        }
    }

    Ok(())
}

fn print_order_result(title: &str, record: &OrderRecord) {
    println!("\n{}", title);
    println!("  Order ID: {}", record.order_id);
    println!("  Symbol: {}", record.symbol);
    println!("  Side: {}", record.side);
    println!("  Type: {}", record.order_type);
    println!("  Status: {}", record.status);
    if record.executed_qty > Decimal::ZERO {
        println!("  Executed Quantity: {}", record.executed_qty);
        println!("  Average Price: {}", record.avg_price);
    }
}

fn print_twap_report(report: &TwapReport) {
    println!("\nTWAP EXECUTION COMPLETED");
    println!(
        "  Executed: {}/{} {}",
        report.executed_total, report.planned_total, report.symbol
    );
    if report.average_price > Decimal::ZERO {
        println!("  Average Price: {}", report.average_price);
    }
    if let (Some(start), Some(end)) = (report.start_price, report.end_price) {
        println!("  Price Change: {} -> {}", start, end);
    }
    if report.interrupted {
        println!("  NOTE: execution was interrupted before all slices ran");
    }
    println!("  Slices:");
    for slice in &report.slices {
        match &slice.outcome {
            SliceOutcome::Placed(record) => println!(
                "    Slice {}: {} @ {} ({})",
                slice.index, record.executed_qty, record.avg_price, record.status
            ),
            SliceOutcome::Failed(reason) => {
                println!("    Slice {}: FAILED - {}", slice.index, reason)
            }
        }
    }
}

fn print_grid_report(report: &GridReport) {
    println!("\nGRID SETUP COMPLETED");
    println!("  Symbol: {}", report.symbol);
    println!("  Current Price: {}", report.reference_price);
    println!("  Buy Orders: {}", report.buy_count());
    println!("  Sell Orders: {}", report.sell_count());
    println!("  Levels:");
    for level in &report.levels {
        match (&level.outcome, level.side) {
            (LevelOutcome::Placed(record), Some(side)) => println!(
                "    Level {} @ {}: {} order {} ({})",
                level.index, level.price, side, record.order_id, record.status
            ),
            (LevelOutcome::Skipped, _) => println!(
                "    Level {} @ {}: skipped (at current price)",
                level.index, level.price
            ),
            (LevelOutcome::Failed(reason), _) => println!(
                "    Level {} @ {}: FAILED - {}",
                level.index, level.price, reason
            ),
            (LevelOutcome::Placed(_), None) => {}
        }
    }
}
