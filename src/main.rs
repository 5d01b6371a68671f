use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use mining_royalty::{
    calculation::parse_due_date,
    io,
    visualization::{
        print_batch_table, print_calculation_summary, print_charge_breakdown,
        print_history_table, print_settings_table,
    },
    AppConfig, JsonFileSlot, RecordStore, RoyaltyCalculationInput, RoyaltyCalculator,
    RoyaltyRecord, SettingsPatch, SettingsStore,
};

#[derive(Parser)]
#[command(
    name = "royalty-calc",
    about = "Mining royalty calculator - blast royalties, settings and saved records",
    version,
    author
)]
struct Cli {
    /// Path to a TOML config file (defaults to ./royalty.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the royalty for a single blast
    Calculate {
        /// Water gel used, in kg
        #[arg(long, allow_negative_numbers = true)]
        water_gel: f64,

        /// Ammonium nitrate (NH4NO3) used, in kg
        #[arg(long, allow_negative_numbers = true)]
        nh4no3: f64,

        /// Powder factor (0 uses the configured default)
        #[arg(long, allow_negative_numbers = true)]
        powder_factor: f64,

        /// Payment due date (YYYY-MM-DD); defaults to today plus the payment terms
        #[arg(long)]
        due_date: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Save the calculation as a royalty record
        #[arg(long, requires = "miner_id")]
        save: bool,

        /// Miner the saved record belongs to
        #[arg(long)]
        miner_id: Option<String>,
    },

    /// Calculate royalties for every blast in a log file (CSV, JSON, or Excel)
    Batch {
        /// Path to the blast log
        #[arg(short, long)]
        input: PathBuf,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change the royalty settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// List saved royalty records
    History {
        /// Only records for this miner
        #[arg(long)]
        miner_id: Option<String>,

        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export saved royalty records to CSV, JSON, or Excel
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Only records for this miner
        #[arg(long)]
        miner_id: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Start the HTTP API server
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show the settings in force
    Show {
        /// Print the settings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one or more settings
    Set(SettingsArgs),
    /// Restore the default settings
    Reset,
}

#[derive(Args)]
struct SettingsArgs {
    #[arg(long, allow_negative_numbers = true)]
    water_gel_multiplier: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    expansion_factor: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    powder_factor_multiplier: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    royalty_rate_per_m3: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    sscl_percentage: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    vat_percentage: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    default_powder_factor: Option<f64>,
}

impl From<SettingsArgs> for SettingsPatch {
    fn from(args: SettingsArgs) -> Self {
        SettingsPatch {
            water_gel_multiplier: args.water_gel_multiplier,
            expansion_factor: args.expansion_factor,
            powder_factor_multiplier: args.powder_factor_multiplier,
            royalty_rate_per_m3: args.royalty_rate_per_m3,
            sscl_percentage: args.sscl_percentage,
            vat_percentage: args.vat_percentage,
            default_powder_factor: args.default_powder_factor,
        }
    }
}

fn settings_store(config: &AppConfig) -> SettingsStore {
    SettingsStore::new(
        JsonFileSlot::new(&config.storage.settings_path),
        config.calculation.percentage_bound(),
    )
}

fn record_store(config: &AppConfig) -> Result<RecordStore> {
    RecordStore::open(&config.storage.database_path).with_context(|| {
        format!(
            "opening royalty database {}",
            config.storage.database_path.display()
        )
    })
}

fn calculator(config: &AppConfig) -> RoyaltyCalculator {
    RoyaltyCalculator::new(settings_store(config).get())
        .with_payment_terms(config.calculation.payment_terms_days)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::discover(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Calculate {
            water_gel,
            nh4no3,
            powder_factor,
            due_date,
            json,
            save,
            miner_id,
        } => {
            let input = RoyaltyCalculationInput::new(water_gel, nh4no3, powder_factor);
            let calculator = calculator(&config);
            let result = match due_date {
                Some(due) => calculator.calculate_due(&input, parse_due_date(&due)?)?,
                None => calculator.calculate(&input)?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_calculation_summary(&result);
                print_charge_breakdown(&result.charge_breakdown());
            }

            if save {
                let miner_id = miner_id.unwrap_or_default();
                let record = RoyaltyRecord::from_result(&miner_id, &result)?;
                record_store(&config)?.insert(&record)?;
                eprintln!(
                    "{} Saved royalty record {} for {}",
                    "Success:".green().bold(),
                    record.id,
                    record.miner_id
                );
            }
        }

        Commands::Batch { input, json } => {
            let rows = io::read_blast_log(&input)
                .with_context(|| format!("reading blast log {}", input.display()))?;
            let inputs: Vec<RoyaltyCalculationInput> =
                rows.iter().map(io::BlastLogRow::input).collect();
            let results = calculator(&config).calculate_batch(&inputs)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!(
                    "\n{}",
                    format!("Blast log: {} ({} blasts)", input.display(), rows.len())
                        .bold()
                        .cyan()
                );
                print_batch_table(&rows, &results);
            }
        }

        Commands::Settings { action } => {
            let store = settings_store(&config);
            match action {
                SettingsAction::Show { json } => {
                    let settings = store.get();
                    if json {
                        println!("{}", serde_json::to_string_pretty(&settings)?);
                    } else {
                        print_settings_table(&settings);
                    }
                }
                SettingsAction::Set(args) => {
                    let patch = SettingsPatch::from(args);
                    if patch.is_empty() {
                        anyhow::bail!(
                            "Nothing to change: pass at least one setting, e.g. --vat-percentage 18"
                        );
                    }
                    let settings = store.apply_patch(&patch)?;
                    println!("{} Settings updated", "Success:".green().bold());
                    print_settings_table(&settings);
                }
                SettingsAction::Reset => {
                    store.reset()?;
                    println!("{} Settings reset to defaults", "Success:".green().bold());
                    print_settings_table(&store.get());
                }
            }
        }

        Commands::History { miner_id, json } => {
            let records = record_store(&config)?.list(miner_id.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_history_table(&records, Utc::now());
            }
        }

        Commands::Export {
            output,
            miner_id,
            pretty,
        } => {
            let records = record_store(&config)?.list(miner_id.as_deref())?;
            let writer = io::writer_for_path(&output, pretty)?;
            writer
                .write(&records, &output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!(
                "{} Exported {} records -> {}",
                "Success:".green().bold(),
                records.len(),
                output.display()
            );
        }

        #[cfg(feature = "web")]
        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(mining_royalty::web::start_server(config))?;
        }
    }

    Ok(())
}
