use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use extrinsic_explorer::error::ExplorerError;
use extrinsic_explorer::form::FormEvent;
use extrinsic_explorer::schema::ChainMetadata;
use extrinsic_explorer::settings::{self, ExplorerSettings};
use extrinsic_explorer::state::{EstimateOutcome, ExplorerState};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "extrinsic-cli", about = "Browse, encode and estimate chain operations", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config directory override
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Schema snapshot (JSON) to load instead of the configured one
    #[arg(long, global = true)]
    metadata: Option<PathBuf>,

    /// Fee estimation service base URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List groups that have at least one operation
    Groups,
    /// List the operations of a group
    Operations { group: String },
    /// Show the input fields for an operation
    Fields { group: String, operation: String },
    /// Encode an operation. Pass "" for a blank optional argument.
    Encode {
        group: String,
        operation: String,
        args: Vec<String>,
    },
    /// Encode an operation and ask the service for its fee
    Estimate {
        group: String,
        operation: String,
        args: Vec<String>,
    },
    /// Show the effective settings
    Settings {
        /// Persist the effective settings (including overrides)
        #[arg(long)]
        save: bool,
    },
}

// ── State initialization ─────────────────────────────────────────

fn effective_settings(cli: &Cli, app_config_dir: &std::path::Path) -> ExplorerSettings {
    let mut s = settings::load_settings(app_config_dir).unwrap_or_default();
    if let Some(path) = &cli.metadata {
        s.metadata_path = Some(path.clone());
    }
    if let Some(endpoint) = &cli.endpoint {
        s.estimate_base_url.clone_from(endpoint);
    }
    s
}

fn initialize_state(settings: &ExplorerSettings, app_config_dir: &std::path::Path) -> ExplorerState {
    let state = ExplorerState::new(settings);
    let metadata_path = settings.metadata_path_or_default(app_config_dir);
    match ChainMetadata::load(&metadata_path) {
        Ok(metadata) => state.connect(Arc::new(metadata)),
        Err(e) => {
            tracing::warn!(path = %metadata_path.display(), "schema snapshot not loaded: {e}");
        }
    }
    state
}

/// Drive the form the way an operator would: group, operation, then each field.
/// More arguments than fields is an arity error, since the form has no slot for them.
fn fill_form(state: &ExplorerState, group: &str, operation: &str, args: &[String]) {
    state.apply(FormEvent::GroupChanged(group.to_string()));
    state.apply(FormEvent::OperationChanged(operation.to_string()));
    let fields = state.fields();
    if args.len() > fields.len() {
        // Report a missing schema or unknown operation ahead of the count.
        if let Err(e) = state.current_payload() {
            if !matches!(e, ExplorerError::ArityMismatch { .. } | ExplorerError::Coercion(_)) {
                fail(e);
            }
        }
        fail(ExplorerError::ArityMismatch {
            expected: fields.len(),
            actual: args.len(),
        });
    }
    for (index, (field, value)) in fields.iter().zip(args).enumerate() {
        state.apply(FormEvent::ParameterChanged {
            index,
            type_tag: field.type_tag.clone(),
            value: value.clone(),
        });
    }
    state.log_selection();
}

// ── Output formatting ────────────────────────────────────────────

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    process::exit(1);
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let raw = cli.json;
    let app_config_dir = cli
        .config_dir
        .clone()
        .unwrap_or_else(extrinsic_explorer::paths::default_config_dir);
    let config = effective_settings(&cli, &app_config_dir);

    if let Commands::Settings { save } = &cli.command {
        if *save {
            if let Err(e) = settings::save_settings(&app_config_dir, &config) {
                fail(e);
            }
            eprintln!("Saved {}", extrinsic_explorer::paths::settings_path(&app_config_dir).display());
        }
        print_json(&config);
        return;
    }

    let state = initialize_state(&config, &app_config_dir);
    if state.schema().is_none() {
        eprintln!("No schema loaded; lists will be empty. Use --metadata <file>.");
    }

    match &cli.command {
        Commands::Groups => {
            let groups = state.group_choices();
            if raw {
                print_json(&groups);
            } else {
                for g in groups {
                    println!("{}", g.label);
                }
            }
        }
        Commands::Operations { group } => {
            state.apply(FormEvent::GroupChanged(group.clone()));
            let ops = state.operation_choices();
            if raw {
                print_json(&ops);
            } else {
                for op in ops {
                    println!("{}", op.label);
                }
            }
        }
        Commands::Fields { group, operation } => {
            fill_form(&state, group, operation, &[]);
            let fields = state.fields();
            if raw {
                print_json(&fields);
            } else {
                for (i, field) in fields.iter().enumerate() {
                    if field.optional {
                        println!("{i}: {} ({})  {}", field.name, field.type_tag, state.optional_msg());
                    } else {
                        println!("{i}: {} ({})", field.name, field.type_tag);
                    }
                }
            }
        }
        Commands::Encode { group, operation, args } => {
            fill_form(&state, group, operation, args);
            match state.current_payload() {
                Ok(payload) if raw => print_json(&serde_json::json!({
                    "payload": payload,
                    "tx": payload.to_hex(),
                })),
                Ok(payload) => println!("{}", payload.to_hex()),
                Err(e) => fail(e),
            }
        }
        Commands::Estimate { group, operation, args } => {
            fill_form(&state, group, operation, args);
            let outcome = state.estimate().await;
            if raw {
                print_json(&outcome);
                return;
            }
            match outcome {
                EstimateOutcome::Updated(quote) => println!("{quote}"),
                EstimateOutcome::Unchanged => println!("No fee returned"),
                EstimateOutcome::Declined => {
                    let reason = state
                        .current_payload()
                        .err()
                        .map_or_else(|| "not ready".to_string(), |e| e.to_string());
                    fail(format!("not estimated: {reason}"));
                }
                EstimateOutcome::Failed(message) => fail(message),
            }
        }
        // Handled before the schema is loaded
        Commands::Settings { .. } => {}
    }
}
