//! adebar-picker: entity picker for the adebar event forms
//!
//! Usage:
//!   adebar-picker                                   - Start the form UI
//!   adebar-picker search <picker> [field=value ...] - Search and print candidates
//!   adebar-picker help                              - Show help

mod app;
mod backend;
mod commands;
mod config;
mod error;
mod picker;
mod render;
mod ui;

use app::PickerApp;
use backend::api::{BackendClient, Catalog, HttpCatalog};
use commands::Command;
use config::AppConfig;
use iced::{window, Size};
use picker::{run_search, EntityPicker};
use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> iced::Result {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = Command::parse(&args);

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match command {
        Command::Ui => start_ui(config),
        Command::Search {
            picker,
            filters,
            html,
        } => {
            if let Err(message) = search_once(config, &picker, &filters, html) {
                eprintln!("Error: {}", message);
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Help => {
            println!("{}", Command::help_text());
            Ok(())
        }
        Command::Invalid { message } => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    }
}

/// Run one picker search and print the candidate rows
fn search_once(
    config: AppConfig,
    picker_name: &str,
    filters: &[(String, String)],
    html: bool,
) -> Result<(), String> {
    let picker_config = config
        .picker(picker_name)
        .cloned()
        .ok_or_else(|| format!("No picker named '{}' is configured", picker_name))?;

    let mut picker = EntityPicker::new(picker_config.clone());
    for (name, value) in filters {
        let index = picker_config
            .filter_fields
            .iter()
            .position(|field| &field.name == name)
            .ok_or_else(|| format!("Picker '{}' has no filter field '{}'", picker_name, name))?;
        picker.set_filter(index, value.clone());
    }

    let config = Arc::new(config);
    let timeout = config.search_timeout();
    let backend = Arc::new(
        BackendClient::new(config).map_err(|e| format!("Failed to build HTTP client: {}", e))?,
    );
    let catalog: Arc<dyn Catalog> = Arc::new(HttpCatalog::new(backend, picker_config));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;
    let ticket = picker.begin_search();
    let response = rt.block_on(run_search(catalog, ticket, timeout));
    picker.finish_search(response);

    if let Some(err) = picker.error() {
        return Err(err.to_string());
    }

    if html {
        println!("{}", render::candidate_rows(&picker));
    } else if picker.show_no_results() {
        println!("No matching records");
    } else {
        for candidate in picker.candidates() {
            println!(
                "{}\t{}\t{}",
                candidate.id,
                candidate.title,
                candidate.details.join("\t")
            );
        }
    }
    Ok(())
}

fn start_ui(config: AppConfig) -> iced::Result {
    tracing::info!("Starting adebar-picker UI");

    let config = Arc::new(config);
    let backend = match BackendClient::new(config.clone()) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            eprintln!("Error: failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    iced::application("Adebar Picker", PickerApp::update, PickerApp::view)
        .subscription(PickerApp::subscription)
        .theme(PickerApp::theme)
        .window(window::Settings {
            size: Size::new(900.0, 700.0),
            position: window::Position::Centered,
            resizable: true,
            ..Default::default()
        })
        .antialiasing(true)
        .run_with(move || PickerApp::new(config, backend))
}
