use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use nisa_plan::api::{self, ApiError};
use nisa_plan::core::run_plan;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "nisa-plan",
    about = "Tax-free investment account retirement planner"
)]
struct Cli {
    /// Log filter, e.g. `info` or `nisa_plan=debug,tower_http=debug`.
    #[arg(long, env = "NISA_PLAN_LOG", default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Run one full plan and print it as JSON.
    Plan {
        #[arg(long)]
        preset: Option<String>,
        /// Request body in the `/api/plan` format; defaults apply when omitted.
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn plan_command(preset: Option<&str>, json: Option<&Path>) -> Result<String, String> {
    let body = match json {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?,
        None => "{}".to_string(),
    };
    let input = api::plan_input_from_json(&body, preset).map_err(|e: ApiError| e.to_string())?;
    serde_json::to_string_pretty(&run_plan(&input)).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    match cli.command {
        Command::Serve { port } => {
            if let Err(e) = api::run_http_server(port).await {
                error!(error = %e, "server error");
                return ExitCode::FAILURE;
            }
        }
        Command::Plan { preset, json } => match plan_command(preset.as_deref(), json.as_deref()) {
            Ok(output) => println!("{output}"),
            Err(e) => {
                error!(error = %e, "plan failed");
                return ExitCode::FAILURE;
            }
        },
    }
    ExitCode::SUCCESS
}
