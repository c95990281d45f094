use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};

use waypoint_rs::adk::model::{create_model, Provider};
use waypoint_rs::waypoint::agents::country::{self, Collaborators, ModelGenerator};
use waypoint_rs::waypoint::config::AppConfig;
use waypoint_rs::waypoint::workflow::graph::RunHandle;

use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the country-facts agent
    Chat {
        /// Path to a YAML configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// The model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Model provider (openai or anthropic), inferred from the model name if omitted
        #[arg(short, long)]
        provider: Option<Provider>,
    },
}

fn print_emitted(handle: &RunHandle) {
    for message in &handle.emitted {
        println!("{}\n", message);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Chat {
            config,
            model,
            provider,
        } => {
            let mut config = match config {
                Some(path) => AppConfig::load(path)?,
                None => AppConfig::default().with_env()?,
            };
            if let Some(name) = model {
                config.model.name = name;
            }
            if provider.is_some() {
                config.model.provider = provider;
            }

            let model = create_model(config.model.provider(), &config.model.name)?;
            let generator = ModelGenerator::new(model, config.model.generation_config());
            let collaborators = Collaborators::from_generator(Arc::new(generator));
            let executor = country::executor(collaborators, &config)?;

            let mut handle = executor.start().await.map_err(|f| f.error)?;
            print_emitted(&handle);

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while !handle.is_terminal() {
                let Some(line) = lines.next_line().await? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                handle = match executor.resume(handle, line).await {
                    Ok(handle) => handle,
                    Err(failure) => {
                        log::error!("Run {} failed: {}", failure.handle.run_id, failure.error);
                        eprintln!("Something went wrong: {}", failure.error);
                        if !failure.error.is_recoverable() {
                            return Err(failure.error.into());
                        }
                        // Give the flaky call one more go before giving up
                        let failed = *failure.handle;
                        match executor.retry(failed).await {
                            Ok(handle) => handle,
                            Err(failure) => return Err(failure.error.into()),
                        }
                    }
                };
                print_emitted(&handle);
            }
        }
    }

    Ok(())
}
