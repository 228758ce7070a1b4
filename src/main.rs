use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Context};
use clap::Parser;
use env_logger::{Env, DEFAULT_FILTER_ENV};
use log::{info, warn, LevelFilter};

use submerge::interfaces::render_by_token;
use submerge::models::AppState;
use submerge::settings::{init_settings, update_settings};
use submerge::web_handlers::interfaces;
use submerge::{OutputFormat, Settings};

/// Merge proxy subscriptions into link bundles and Clash configs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Listen address (e.g., 127.0.0.1 or 0.0.0.0)
    #[arg(short, long, value_name = "ADDRESS")]
    address: Option<String>,

    /// Listen port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Store snapshot holding sources and groups
    #[arg(short, long, value_name = "FILE")]
    store: Option<String>,

    /// Render the group with this token once instead of starting the server
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Output format of a one-shot render: base64 or clash
    #[arg(short, long, value_name = "FORMAT", default_value = "base64")]
    format: String,

    /// Write a one-shot render to this file instead of stdout (must be used with --token)
    #[arg(short, long, value_name = "OUTPUT_FILE")]
    output: Option<String>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize the logger before anything else logs; the level from settings is applied below
    let filter_from_env = std::env::var_os(DEFAULT_FILTER_ENV).is_some();
    env_logger::init_from_env(Env::default().default_filter_or("trace"));
    if !filter_from_env {
        log::set_max_level(LevelFilter::Info);
    }

    let args = Args::parse();

    if args.output.is_some() && args.token.is_none() {
        return Err(anyhow!("--output must be used together with --token"));
    }

    // Initialize settings with config file path if provided
    init_settings(args.config.as_deref().unwrap_or(""))
        .map_err(|e| anyhow!("Failed to load settings: {}", e))?;

    // Override settings with command line arguments if provided
    update_settings(|settings| {
        if let Some(address) = args.address.clone() {
            settings.listen_address = address;
        }
        if let Some(port) = args.port {
            settings.listen_port = port;
        }
        if let Some(store) = args.store.clone() {
            settings.store_path = store;
        }
    });
    let settings = Settings::current();

    if !filter_from_env {
        match settings.level_filter() {
            Some(level) => log::set_max_level(level),
            None => warn!("Unknown log level '{}', keeping info", settings.log_level),
        }
    }

    let app_state = Arc::new(
        AppState::from_settings(Arc::clone(&settings)).context("Failed to load the store")?,
    );

    if let Some(token) = args.token {
        let format: OutputFormat = args.format.parse()?;
        let store = app_state.store.as_ref();
        let output = render_by_token(store, store, &token, format)
            .await
            .with_context(|| format!("Failed to render group {}", token))?;

        match args.output {
            Some(path) => {
                std::fs::write(&path, output.body)
                    .with_context(|| format!("Failed to write {}", path))?;
                info!("Wrote {} to {}", output.filename, path);
            }
            None => println!("{}", output.body),
        }
        return Ok(());
    }

    let listen_address = settings.bind_address();
    info!("submerge starting on {}", listen_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(Arc::clone(&app_state)))
            .configure(interfaces::config)
    })
    .bind(&listen_address)
    .with_context(|| format!("Failed to bind {}", listen_address))?
    .workers(settings.max_concur_threads)
    .run()
    .await?;
    Ok(())
}
