use anyhow::Result;
use clap::Parser;
use tabfit::cli::{cmd_train, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tabfit=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Train {
            train,
            test,
            target,
            task,
            metric,
            cv_folds,
            random_search,
            seed,
            output_dir,
        } => cmd_train(
            &train,
            &test,
            &target,
            task,
            metric,
            cv_folds,
            random_search,
            seed,
            &output_dir,
        )?,
    }

    Ok(())
}
