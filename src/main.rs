use anyhow::Result;
use clap::{Parser, Subcommand};
use formdrop::{
    config::{AppConfig, CONFIG_FILE},
    form::{FormController, HttpTransport, SelectedFile, SubmitOutcome, TerminalView},
};
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "formdrop")]
#[command(about = "Upload a file with your name and email", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit the upload form
    Send {
        /// File to upload (10MB max)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Your name
        #[arg(short, long)]
        name: String,

        /// Your email address
        #[arg(short, long)]
        email: String,

        /// Server URL (e.g. http://localhost:8080)
        #[arg(short, long)]
        server: Option<String>,

        /// Upload endpoint path on the server
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Generate configuration file (.formdrop.toml) in current directory
    Genconfig {
        /// Force overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logger, default info level, display file line number and time
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            let level_style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "[{} {level_style}{}{level_style:#} {}:{}] {level_style}{}{level_style:#}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();

    let cli = Cli::parse();

    let app_config = if std::path::Path::new(CONFIG_FILE).exists() {
        match AppConfig::load_from_file(CONFIG_FILE) {
            Ok(cfg) => {
                info!("Using configuration file: {}", CONFIG_FILE);
                cfg
            }
            Err(e) => {
                error!("Failed to load configuration file: {}, using defaults", e);
                AppConfig::default()
            }
        }
    } else {
        AppConfig::default()
    };

    match cli.command {
        Commands::Send {
            file,
            name,
            email,
            server,
            endpoint,
        } => {
            let client = app_config.resolve_client(server, endpoint);
            let transport = HttpTransport::new(&client.server, &client.endpoint)?;
            let controller = FormController::new(TerminalView::new(), transport);

            controller.set_name(name);
            controller.set_email(email);
            if !controller.select_file(SelectedFile::from_path(&file)?) {
                std::process::exit(1);
            }

            match controller.submit() {
                SubmitOutcome::Uploaded { file_url } => {
                    if let Some(url) = file_url {
                        println!("{}", url);
                    }
                }
                _ => std::process::exit(1),
            }
        }

        Commands::Genconfig { force } => {
            if let Err(e) = AppConfig::generate_config_file(CONFIG_FILE, force) {
                error!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
