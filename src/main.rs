//! vCD Toolkit CLI
//!
//! Entry point for the `vcd-toolkit` command-line tool.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vcd_toolkit::download::{DownloadOutcome, Downloader};
use vcd_toolkit::files::{sha256_file, DataFileLocator};
use vcd_toolkit::http::ApiClient;
use vcd_toolkit::protocol::error_to_json;
use vcd_toolkit::{bool_to_msg, Config};

#[derive(Parser)]
#[command(name = "vcd-toolkit")]
#[command(about = "Helpers for automating vCloud Director", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SHA-256 of a file
    Sha256 {
        file: PathBuf,
    },

    /// Download a file unless an up-to-date copy exists
    Download {
        url: String,

        /// Destination path
        dest: PathBuf,

        /// Expected SHA-256; an existing file with another digest is replaced
        #[arg(long)]
        sha256: Option<String>,
    },

    /// Locate a packaged data file and print its contents
    DataFile {
        name: String,

        /// Extra directories to search (after the working directory and
        /// VCD_TOOLKIT_PATH)
        #[arg(long = "search")]
        search: Vec<PathBuf>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Raw API requests
    Api {
        #[command(subcommand)]
        action: ApiCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Validate a config file
    Check {
        path: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ApiCommands {
    /// GET a JSON document and print it
    Get {
        url: String,

        /// Bearer token for the Authorization header
        #[arg(long)]
        token: Option<String>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sha256 { file } => run_sha256(&file),
        Commands::Download { url, dest, sha256 } => run_download(&url, &dest, sha256.as_deref()),
        Commands::DataFile { name, search } => run_data_file(&name, search),
        Commands::Config { action } => match action {
            ConfigCommands::Check { path, json } => run_config_check(&path, json),
        },
        Commands::Api { action } => match action {
            ApiCommands::Get { url, token } => run_api_get(&url, token.as_deref()),
        },
    }
}

fn run_sha256(file: &Path) {
    match sha256_file(file) {
        Ok(digest) => println!("{}  {}", digest, file.display()),
        Err(e) => {
            eprintln!("Error hashing {}: {}", file.display(), e);
            process::exit(1);
        }
    }
}

fn run_download(url: &str, dest: &Path, sha256: Option<&str>) {
    match Downloader::new().download_file(url, dest, sha256) {
        Ok(DownloadOutcome::Skipped) => println!("Up to date: {}", dest.display()),
        Ok(DownloadOutcome::Downloaded { bytes }) => {
            println!("Downloaded {} bytes to {}", bytes, dest.display())
        }
        Err(e) => {
            eprintln!("Download failed: {}", e);
            process::exit(1);
        }
    }
}

fn run_data_file(name: &str, search: Vec<PathBuf>) {
    let locator = search
        .into_iter()
        .fold(DataFileLocator::from_env(), DataFileLocator::with_base);

    match locator.read(name) {
        Ok(contents) => print!("{}", contents),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_config_check(path: &Path, json_output: bool) {
    let result = Config::load(path);

    if json_output {
        let output = match &result {
            Ok(config) => serde_json::json!({
                "path": path.display().to_string(),
                "status": bool_to_msg(true),
                "host": config.vcd.host,
                "vcenters": config.vcs.iter().map(|vc| vc.name.as_str()).collect::<Vec<_>>(),
            }),
            Err(e) => serde_json::json!({
                "path": path.display().to_string(),
                "status": bool_to_msg(false),
                "error": error_to_json(Some(e)),
            }),
        };
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        match &result {
            Ok(config) => {
                println!("Configuration valid: {}", path.display());
                println!();
                println!("  Host: {}", config.vcd.host);
                println!("  API version: {}", config.vcd.api_version);
                if !config.vcs.is_empty() {
                    let names: Vec<&str> = config.vcs.iter().map(|vc| vc.name.as_str()).collect();
                    println!("  vCenters: {}", names.join(", "));
                }
            }
            Err(e) => eprintln!("Configuration error: {}", e),
        }
    }

    if result.is_err() {
        process::exit(1);
    }
}

fn run_api_get(url: &str, token: Option<&str>) {
    let client = match token {
        Some(token) => ApiClient::new().with_bearer_token(token),
        None => ApiClient::new(),
    };

    let output = match client.get_json(url) {
        Ok(value) => value,
        Err(e) => {
            let report = error_to_json(Some(&e));
            eprintln!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
            process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}
