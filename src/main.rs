//! Binary entry point for the proxyfleet CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use proxyfleet::{
    ConfigError, CreatedInstance, GceConfig, GceError, GceProvider, InstanceModel, Provider,
};

mod cli;

use cli::{Cli, Command};

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("provider error: {0}")]
    Provider(#[from] GceError),
    #[error("no managed instance named {name}")]
    UnknownInstance { name: String },
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config = GceConfig::load_without_cli_args()?;
    let provider = GceProvider::new(config, cli.instance_port)?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Command::List => {
            for model in provider.models().await? {
                writeln!(stdout, "{}", render_model(&model))?;
            }
        }
        Command::Create(args) => {
            for instance in provider.create_instances(args.count).await? {
                writeln!(stdout, "{}", render_created(&instance))?;
            }
        }
        Command::Start(args) => {
            let model = find_model(provider.models().await?, &args.name)?;
            provider.start_instance(&model).await?;
            writeln!(stdout, "started {}", model.name)?;
        }
        Command::Remove(args) => {
            let model = find_model(provider.models().await?, &args.name)?;
            provider.remove_instance(&model).await?;
            writeln!(stdout, "removed {}", model.name)?;
        }
    }
    Ok(())
}

fn find_model(models: Vec<InstanceModel>, name: &str) -> Result<InstanceModel, CliError> {
    models
        .into_iter()
        .find(|model| model.name == name)
        .ok_or_else(|| CliError::UnknownInstance {
            name: name.to_owned(),
        })
}

fn render_model(model: &InstanceModel) -> String {
    let address = model
        .address
        .as_ref()
        .map_or_else(|| String::from("-"), ToString::to_string);
    format!(
        "{}\t{}\t{}\t{}",
        model.name, model.state, model.region, address
    )
}

fn render_created(instance: &CreatedInstance) -> String {
    format!("{}\t{}", instance.name, instance.region)
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
