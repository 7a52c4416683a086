mod config;
mod dataset;
mod kitchen;
mod metrics;
mod protocol;
mod server;
mod session;
mod startup;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use startup::StartupValidator;
use clap::Parser;
use config::ServerConfig;
use dataset::SymbolId;
use kitchen::{encode_selection, Kitchen, Selection};

#[derive(Parser)]
#[command(name = "kitchend")]
#[command(about = "Emoji Kitchen combination server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long, help = "Config file path")]
    config: Option<String>,

    #[arg(long, help = "Data directory path (overrides config)")]
    data: Option<String>,

    #[arg(long, help = "Session listen address (overrides config)")]
    listen: Option<String>,

    #[arg(long, help = "Status listen address (overrides config)")]
    status_listen: Option<String>,

    #[arg(long, help = "Trust the dataset instead of probing the asset store")]
    no_probe: bool,

    #[arg(long, help = "Output as JSON")]
    json: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show configuration and dataset location
    Status,
    /// Show dataset statistics
    Stats,
    /// Load and cross-check the catalogue and pair table
    VerifyData,
    /// List the selectable symbols
    Catalogue,
    /// Resolve two symbols to their combination
    Resolve { first: String, second: String },
    /// List the symbols that combine with one symbol
    Partners { symbol: String },
    /// Pick a random resolvable pair
    Random,
    /// Build a share link from up to two symbols
    Link { symbols: Vec<String> },
    /// Render the view for a share link
    View { link: String },
    /// Write a default config file
    GenerateConfig {
        #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, help = "Config file path")]
        output: String,
    },
}

fn parse_symbol(raw: &str) -> anyhow::Result<SymbolId> {
    SymbolId::parse(raw).with_context(|| format!("Invalid symbol '{}'", raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::GenerateConfig { output }) = &cli.command {
        ServerConfig::default().save(output)?;
        if cli.json {
            println!("{}", serde_json::json!({"success": true, "output": output}));
        } else {
            println!("✅ Wrote default configuration to {}", output);
        }
        return Ok(());
    }

    // Load configuration
    let mut config = ServerConfig::load_or_create(cli.config.as_deref())?;

    // Override config with CLI args if provided
    if let Some(data) = cli.data {
        config.data_directory = data.into();
    }
    if let Some(listen) = cli.listen {
        config.listen_address = listen;
    }
    if let Some(status_listen) = cli.status_listen {
        config.status_address = status_listen;
    }
    if cli.no_probe {
        config.probe_assets = false;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Status) => {
            let ready = config.catalogue_path().exists() && config.pairs_path().exists();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                    "status": if ready { "ready" } else { "not_initialized" },
                    "catalogue": config.catalogue_path(),
                    "pairs": config.pairs_path(),
                    "listen_address": config.listen_address,
                    "status_address": config.status_address,
                    "probe_assets": config.probe_assets,
                }))?);
            } else {
                println!("📊 Kitchen Server Status");
                println!("========================");
                if ready {
                    println!("✅ Status: Ready");
                } else {
                    println!("❌ Status: Not initialized (dataset files missing)");
                }
                println!("   Catalogue: {}", config.catalogue_path().display());
                println!("   Pairs: {}", config.pairs_path().display());
                println!("   Listen address: {}", config.listen_address);
                println!("   Status address: {}", config.status_address);
                println!("   Asset probe: {}", if config.probe_assets { "on" } else { "off" });
            }
        }
        Some(command @ (Commands::Stats | Commands::VerifyData)) => {
            let verify = matches!(command, Commands::VerifyData);
            let result = StartupValidator::new(&config).and_then(|v| v.validate_and_start());
            match result {
                Ok(report) => {
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        println!("📈 Dataset Statistics");
                        println!("====================");
                        println!("   Catalogue symbols: {}", report.catalogue_size);
                        println!("   Pair records: {}", report.pair_records);
                        println!("   Distinct pairs: {}", report.distinct_pairs);
                        println!("   Symbols with combinations: {}", report.symbols_with_partners);
                        println!("   Fingerprint: {}", report.fingerprint);
                        if verify {
                            if !report.duplicate_symbols.is_empty() {
                                println!("   ⚠️  Duplicate catalogue entries: {:?}", report.duplicate_symbols);
                            }
                            if !report.uncatalogued_symbols.is_empty() {
                                println!("   ⚠️  Paired but not selectable: {}", report.uncatalogued_symbols.len());
                            }
                            println!("✅ Dataset verification PASSED");
                        }
                    }
                }
                Err(e) => {
                    if cli.json {
                        println!("{}", serde_json::json!({"error": format!("{:#}", e)}));
                    } else {
                        println!("❌ Dataset verification FAILED: {:#}", e);
                    }
                    return Err(e);
                }
            }
        }
        Some(Commands::Catalogue) => {
            let kitchen = Kitchen::from_config(&config)?;
            let ids = kitchen.catalogue().ids();
            if cli.json {
                let entries: Vec<_> = ids
                    .iter()
                    .map(|id| serde_json::json!({
                        "id": id,
                        "emoji": id.to_emoji(),
                        "combinations": kitchen.partners(id).len(),
                    }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                println!("📋 Catalogue ({} symbols)", ids.len());
                println!("==========================");
                for id in ids {
                    println!("   {} {} ({} combinations)", id.to_emoji(), id, kitchen.partners(id).len());
                }
            }
        }
        Some(Commands::Resolve { first, second }) => {
            let kitchen = Kitchen::from_config(&config)?;
            let mut selection = Selection::new();
            kitchen.select(&mut selection, parse_symbol(&first)?)?;
            kitchen.select(&mut selection, parse_symbol(&second)?)?;
            print_view(&kitchen, &selection, cli.json).await?;
        }
        Some(Commands::Partners { symbol }) => {
            let kitchen = Kitchen::from_config(&config)?;
            let id = parse_symbol(&symbol)?;
            let partners = kitchen.partners(&id);
            if cli.json {
                println!("{}", serde_json::json!({"symbol": id, "partners": partners}));
            } else {
                println!("🤝 Partners of {} {}", id.to_emoji(), id);
                println!("==================");
                if partners.is_empty() {
                    println!("   No combinations found");
                }
                for partner in partners {
                    println!("   {} {}", partner.to_emoji(), partner);
                }
            }
        }
        Some(Commands::Random) => {
            let kitchen = Kitchen::from_config(&config)?;
            let mut selection = Selection::new();
            kitchen.pick_random(&mut selection)?;
            print_view(&kitchen, &selection, cli.json).await?;
        }
        Some(Commands::Link { symbols }) => {
            let ids = symbols.iter().map(|s| parse_symbol(s)).collect::<anyhow::Result<Vec<_>>>()?;
            let link = encode_selection(&Selection::from_ids(ids));
            if cli.json {
                println!("{}", serde_json::json!({"link": link}));
            } else {
                println!("?{}", link);
            }
        }
        Some(Commands::View { link }) => {
            let kitchen = Kitchen::from_config(&config)?;
            let selection = kitchen.open_link(&link)?;
            print_view(&kitchen, &selection, cli.json).await?;
        }
        // written before the config file was touched
        Some(Commands::GenerateConfig { .. }) => {}
        None => {
            // Normal server startup
            info!("Starting kitchen server on {}", config.listen_address);

            let validator = StartupValidator::new(&config)?;
            validator.validate_and_start()?;
            let kitchen = Kitchen::from_dataset(&config, validator.into_dataset())?;

            server::run(&config, kitchen).await?;
        }
    }

    Ok(())
}

async fn print_view(kitchen: &Kitchen, selection: &Selection, json: bool) -> anyhow::Result<()> {
    let view = kitchen.view(selection).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({
            "view": view,
            "link": encode_selection(selection),
        }))?);
    } else {
        println!("{}", view.summary());
        println!("   link: ?{}", encode_selection(selection));
    }
    Ok(())
}
