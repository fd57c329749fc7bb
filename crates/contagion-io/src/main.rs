use contagion_io::cli::{Cli, Commands, RunArgs, run_simulation_command};
use contagion_sampler::ModelArgs;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,contagion_sampler=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            graph,
            action,
            initiator,
            threshold,
            probability_of_infection,
            lifespan,
            shelter,
            vaccinations,
            max_steps,
            seed,
            repetitions,
            params,
            out,
            plot,
            interactive,
        } => {
            run_simulation_command(RunArgs {
                graph,
                action,
                initiator,
                model: ModelArgs {
                    threshold,
                    probability_of_infection,
                    lifespan,
                    shelter,
                    vaccinations,
                    ..ModelArgs::default()
                },
                max_steps,
                seed,
                repetitions,
                params,
                out,
                plot,
                interactive,
            }).await?;
        }
    }

    Ok(())
}
