use clap::Parser;
use mdview::Settings;
use mdview::cli::commands::{init, serve, tree};
use mdview::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Init runs before settings load so a broken settings file can be replaced
    if let Commands::Init { force } = cli.command {
        init::run_init(force);
        return;
    }

    let config = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    mdview::logging::init_with_config(&config.logging);

    match cli.command {
        Commands::Serve {
            root,
            bind,
            no_watch,
            static_dir,
        } => {
            let args = serve::ServeArgs {
                root,
                bind,
                no_watch,
                static_dir,
            };
            serve::run(args, config).await;
        }
        Commands::Tree { root, json } => tree::run(root, json, &config),
        Commands::Config => init::run_config(&config),
        Commands::Init { .. } => {}
    }
}
