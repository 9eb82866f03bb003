mod cli;
mod commands;
mod config;
mod dispatcher;
mod error;
mod service;

use clap::Parser;
use dt_xsd_tree::{render, segment::SCHEMA_SENTINEL, Segment, SchemaTree};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::{execute, load_schema, Report};
use config::Config;
use dispatcher::Dispatcher;
use error::AppError;
use service::http::HttpSchemaService;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;
    debug!("composer service at {}", config.base_url);

    let mut dispatcher = Dispatcher::new(HttpSchemaService::new(config)?);
    let mut tree = if cli.command.needs_schema() {
        load_schema(cli.schema.as_deref(), cli.allow_dtd, dispatcher.service())?
    } else {
        SchemaTree::new(Segment::new(None::<String>, SCHEMA_SENTINEL))
    };

    match execute(&mut dispatcher, &mut tree, &cli.command)? {
        Report::Schema => print!("{}", render(&tree)),
        Report::Occurrences(occurs) => println!("{occurs}"),
        Report::Done => {}
    }
    Ok(())
}
