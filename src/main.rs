use clap::Parser;
use switchboard::cli::{
    handle_completions, handle_config_init, load_config, route, stats, workers, Cli, Commands,
    ConfigCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => switchboard::cli::serve::run_serve(args).await,
        Commands::Route(args) => load_config(&args.config)
            .and_then(|config| route::handle_route(&args, &config))
            .map(|output| println!("{}", output)),
        Commands::Workers(args) => load_config(&args.config)
            .and_then(|config| workers::handle_workers(&args, &config))
            .map(|output| println!("{}", output)),
        Commands::Stats(args) => load_config(&args.config)
            .and_then(|config| stats::handle_stats(&args, &config))
            .map(|output| println!("{}", output)),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
