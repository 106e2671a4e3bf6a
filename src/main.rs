//! forgeml - Main Entry Point

use clap::Parser;
use forgeml::cli::{
    cmd_list, cmd_predict, cmd_profile, cmd_recommend, cmd_show, cmd_train, cmd_transform, Cli,
    Commands,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forgeml=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let models_dir = cli.models_dir.as_deref();

    match cli.command {
        Commands::Profile { data, target } => cmd_profile(&data, target.as_deref())?,
        Commands::Transform { data, steps, output, head } => {
            cmd_transform(&data, &steps, output.as_deref(), head)?
        }
        Commands::Train {
            data,
            target,
            algorithm,
            steps,
            problem_type,
            seed,
            n_estimators,
        } => cmd_train(
            models_dir,
            &data,
            &target,
            algorithm.as_deref(),
            steps.as_deref(),
            problem_type.as_deref(),
            seed,
            n_estimators,
        )?,
        Commands::Predict { model_id, input, rows } => {
            cmd_predict(models_dir, &model_id, input.as_deref(), rows.as_deref())?
        }
        Commands::Show { model_id } => cmd_show(models_dir, &model_id)?,
        Commands::List => cmd_list(models_dir)?,
        Commands::Recommend { problem_type } => cmd_recommend(&problem_type)?,
    }

    Ok(())
}
