use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tollgate_fees::ExclusionRegistry;
use tollgate_governance::{GenesisState, GovernanceHandler, ParamsKeeper, Proposal, ProposalContent};
use tollgate_mint::MinterState;
use tollgate_types::{module_accounts, BankKeeper, BlockTime, EventManager, Transaction};
use tracing::{error, info, warn};
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod config;
mod genesis;
mod ledger;
mod pipeline;
mod store;

use config::{NodeConfig, Overrides, StorageKind};
use genesis::NodeGenesis;
use ledger::MemoryLedger;
use pipeline::Pipeline;
use store::NodeStore;

const DEFAULT_GENESIS_PATH: &str = "config/genesis.json";

/// A transaction scheduled for inclusion at a given height.
#[derive(Debug, Deserialize)]
struct ScheduledTx {
    height: u64,
    tx: Transaction,
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn cli() -> Command {
    Command::new("tollgate-node")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tollgate economics node: fee admission, inflation minting and governance")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file path")
                .global(true),
        )
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Data directory")
                .global(true),
        )
        .arg(
            Arg::new("storage")
                .long("storage")
                .value_name("BACKEND")
                .value_parser(value_parser!(StorageKind))
                .help("State backend (memory or sled)")
                .global(true),
        )
        .arg(
            Arg::new("genesis")
                .short('g')
                .long("genesis")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Genesis file path")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .help("Override the log level")
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .value_parser(["pretty", "json"])
                .help("Select log output format")
                .global(true),
        )
        .arg(
            Arg::new("metrics")
                .long("metrics")
                .action(ArgAction::SetTrue)
                .help("Install the Prometheus metrics recorder and print a snapshot on exit")
                .global(true),
        )
        .subcommand(
            Command::new("run")
                .about("Produce blocks, minting at each block and admitting scheduled transactions")
                .arg(
                    Arg::new("blocks")
                        .long("blocks")
                        .value_name("N")
                        .value_parser(value_parser!(u64))
                        .help("Number of blocks to produce"),
                )
                .arg(
                    Arg::new("txs")
                        .long("txs")
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON list of {height, tx} entries to include"),
                ),
        )
        .subcommand(
            Command::new("query")
                .about("Read economics state")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("excluded").about("List fee-excluded message types"))
                .subcommand(Command::new("minter").about("Show the minter state"))
                .subcommand(Command::new("params").about("Show fee and mint parameters")),
        )
        .subcommand(
            Command::new("propose")
                .about("Apply a governance proposal read from a JSON file")
                .arg(
                    Arg::new("file")
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf))
                        .required(true)
                        .help("Proposal JSON"),
                ),
        )
        .subcommand(Command::new("validate-genesis").about("Check a genesis file and exit"))
        .subcommand(Command::new("export-genesis").about("Print the economics genesis built from current state"))
        .subcommand(Command::new("show-config").about("Print the effective configuration as TOML"))
}

fn run_cli() -> Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    init_logging(&config)?;
    let metrics = init_metrics(&config);

    match matches.subcommand() {
        Some(("run", sub)) => run_blocks(&config, sub)?,
        Some(("query", sub)) => query(&config, sub)?,
        Some(("propose", sub)) => {
            let path = sub
                .get_one::<PathBuf>("file")
                .context("missing proposal file")?;
            propose(&config, path)?
        }
        Some(("validate-genesis", _)) => {
            let path = genesis_path(&config);
            let genesis = NodeGenesis::load(&path)?;
            genesis.validate()?;
            info!(path = %path.display(), "genesis file is valid");
            println!("genesis {} is valid", path.display());
        }
        Some(("export-genesis", _)) => {
            let store = open_initialized(&config)?.0;
            let exported = GenesisState::export(&store)?;
            println!("{}", exported.to_json_pretty()?);
        }
        Some(("show-config", _)) => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        _ => unreachable!("subcommand_required is set"),
    }

    if let Some(handle) = metrics {
        println!("{}", handle.render());
    }
    Ok(())
}

fn load_config(matches: &ArgMatches) -> Result<NodeConfig> {
    let mut config = NodeConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    let blocks = matches
        .subcommand_matches("run")
        .and_then(|sub| sub.get_one::<u64>("blocks").copied());
    config.apply_overrides(Overrides {
        log_level: matches.get_one::<String>("log-level").cloned(),
        log_format: matches.get_one::<String>("log-format").cloned(),
        data_dir: matches.get_one::<PathBuf>("data-dir").cloned(),
        storage: matches.get_one::<StorageKind>("storage").copied(),
        genesis_path: matches.get_one::<PathBuf>("genesis").cloned(),
        blocks,
        metrics: matches.get_flag("metrics"),
    });
    config.validate()?;
    Ok(config)
}

fn init_logging(config: &NodeConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

/// One JSON object per line, without ANSI styling.
fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
}

fn init_metrics(config: &NodeConfig) -> Option<PrometheusHandle> {
    if !config.metrics_enabled {
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics recorder registered");
            describe_counter!("tollgate_txs_admitted_total", "Transactions admitted and executed");
            describe_counter!(
                "tollgate_txs_rejected_total",
                "Transactions rejected at admission or execution"
            );
            describe_counter!(
                "tollgate_fees_collected_total",
                "System fees moved to the fee collector, in the base denomination"
            );
            describe_counter!("tollgate_minted_total", "Units minted by block inflation");
            Some(handle)
        }
        Err(err) => {
            warn!("Failed to install Prometheus metrics recorder: {}", err);
            None
        }
    }
}

fn genesis_path(config: &NodeConfig) -> PathBuf {
    config
        .genesis_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GENESIS_PATH))
}

/// Open the configured store and seed it from genesis when it carries no
/// minter state yet.
fn open_initialized(config: &NodeConfig) -> Result<(NodeStore, NodeGenesis)> {
    let path = genesis_path(config);
    let genesis = NodeGenesis::load(&path)?;
    genesis.validate()?;

    let store = NodeStore::open(config)?;
    let initialized = MinterState::load(&store)?.is_some();
    if initialized {
        info!(storage = %config.storage, "reusing existing economics state");
    } else {
        genesis.economics.init(&store)?;
        store.flush()?;
        info!(genesis = %path.display(), "economics state initialised from genesis");
    }
    Ok((store, genesis))
}

fn load_schedule(path: &Path) -> Result<BTreeMap<u64, Vec<Transaction>>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading transaction file {}", path.display()))?;
    let entries: Vec<ScheduledTx> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing transaction file {}", path.display()))?;

    let mut schedule: BTreeMap<u64, Vec<Transaction>> = BTreeMap::new();
    for entry in entries {
        if entry.height == 0 {
            anyhow::bail!("transaction scheduled at height 0; heights start at 1");
        }
        schedule.entry(entry.height).or_default().push(entry.tx);
    }
    Ok(schedule)
}

/// Timestamp of `height`, spaced `interval_ms` apart from genesis time.
fn block_time(genesis_time: BlockTime, height: u64, interval_ms: u64) -> BlockTime {
    let offset = height
        .saturating_sub(1)
        .saturating_mul(interval_ms)
        .saturating_mul(1_000);
    genesis_time.saturating_add_micros(offset)
}

fn run_blocks(config: &NodeConfig, matches: &ArgMatches) -> Result<()> {
    let mut schedule = match matches.get_one::<PathBuf>("txs") {
        Some(path) => load_schedule(path)?,
        None => BTreeMap::new(),
    };
    if let Some(last) = schedule.keys().next_back() {
        if *last > config.blocks {
            warn!(last_height = last, blocks = config.blocks, "some scheduled transactions lie past the final block");
        }
    }

    let (store, genesis) = open_initialized(config)?;
    let ledger = MemoryLedger::from_genesis(&genesis);
    let mut pipeline = Pipeline::new(store, ledger);

    info!(blocks = config.blocks, storage = %config.storage, "starting block production");
    for height in 1..=config.blocks {
        let time = block_time(genesis.genesis_time, height, config.block_interval_ms);
        let txs = schedule.remove(&height).unwrap_or_default();
        match pipeline.process_block(height, time, &txs) {
            Ok(outcome) => {
                for rejected in &outcome.rejected {
                    println!("block {height}: tx {} rejected: {}", rejected.index, rejected.reason);
                }
                println!(
                    "block {} at {}: minted {} admitted {} rejected {} fees {} events {}",
                    outcome.height,
                    outcome.time,
                    outcome.mint.minted,
                    outcome.admitted,
                    outcome.rejected.len(),
                    outcome.fees_collected,
                    outcome.events.len()
                );
            }
            Err(fault) => {
                error!(height, %time, error = %fault, "consensus fault, halting");
                pipeline.store().flush()?;
                return Err(fault).context(format!("block {height} aborted"));
            }
        }
    }
    pipeline.store().flush()?;

    let ledger = pipeline.ledger();
    for module in [
        module_accounts::FEE_COLLECTOR,
        module_accounts::TREASURY_POOL,
        module_accounts::REWARDS_POOL,
    ] {
        println!("{module}: {}", ledger.module_balance(module));
    }
    for (name, record) in ledger.names() {
        println!("name {name}: {}", serde_json::to_string(record)?);
    }
    println!("total supply: {}", ledger.total_supply());
    Ok(())
}

fn query(config: &NodeConfig, matches: &ArgMatches) -> Result<()> {
    let (store, _) = open_initialized(config)?;
    match matches.subcommand() {
        Some(("excluded", _)) => {
            for message_type in ExclusionRegistry::new(&store).list_all()? {
                println!("{message_type}");
            }
        }
        Some(("minter", _)) => {
            let state = MinterState::load(&store)?.context("minter state missing")?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Some(("params", _)) => {
            let keeper = ParamsKeeper::new(&store);
            let params = serde_json::json!({
                "fee": keeper.fee_params()?,
                "mint": keeper.mint_params()?,
            });
            println!("{}", serde_json::to_string_pretty(&params)?);
        }
        _ => unreachable!("subcommand_required is set"),
    }
    Ok(())
}

fn propose(config: &NodeConfig, path: &Path) -> Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading proposal {}", path.display()))?;
    let proposal: Proposal = serde_json::from_str(&raw)
        .with_context(|| format!("parsing proposal {}", path.display()))?;

    let (store, _) = open_initialized(config)?;
    if config.storage == StorageKind::Memory {
        warn!("memory storage selected; the proposal will not outlive this process");
    }

    let content = proposal.content();
    info!(
        proposal_type = content.proposal_type(),
        title = content.title(),
        "applying governance proposal"
    );
    let mut events = EventManager::new();
    GovernanceHandler::new(&store).handle(&proposal, &mut events)?;
    store.flush()?;
    for event in events.events() {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn json_log_lines_parse_as_json() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::registry().with(json_layer(captured.clone()));
        tracing::subscriber::with_default(subscriber, || {
            info!(target: "node", height = 7u64, "block processed");
        });

        let raw = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(!raw.contains('\u{1b}'), "ANSI escape in json output: {raw:?}");
        let line = raw.lines().next().unwrap();
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["target"], "node");
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["fields"]["message"], "block processed");
        assert_eq!(value["fields"]["height"], 7);
    }

    #[test]
    fn block_times_are_spaced_from_genesis() {
        let genesis = BlockTime::from_secs(100);
        assert_eq!(block_time(genesis, 1, 5_000), genesis);
        assert_eq!(block_time(genesis, 3, 5_000), BlockTime::from_secs(110));
    }

    #[test]
    fn schedule_groups_by_height() {
        let payer = format!("t{}", "01".repeat(32));
        let raw = format!(
            r#"[
                {{"height": 2, "tx": {{"fee_payer": "{payer}", "messages": [{{"type": "other", "type_url": "x/Y"}}]}}}},
                {{"height": 2, "tx": {{"fee_payer": "{payer}", "messages": [{{"type": "other", "type_url": "x/Z"}}]}}}}
            ]"#
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(raw.as_bytes()).unwrap();

        let schedule = load_schedule(file.path()).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[&2].len(), 2);
    }

    #[test]
    fn height_zero_rejected() {
        let payer = format!("t{}", "01".repeat(32));
        let raw = format!(
            r#"[{{"height": 0, "tx": {{"fee_payer": "{payer}", "messages": []}}}}]"#
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(raw.as_bytes()).unwrap();
        assert!(load_schedule(file.path()).is_err());
    }
}
