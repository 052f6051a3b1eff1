use clap::Parser;
use relay::cli::{build_components, exec, health, route, usage, Cli, Commands};
use relay::config::RelayConfig;
use relay::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match RelayConfig::load(cli.config.as_deref()) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    logging::init(&config.logging, cli.log_level.as_deref());

    let components = build_components(&config);
    let result = match cli.command {
        Commands::Route(args) => route::handle_route(&args, &components).await,
        Commands::Exec(args) => exec::handle_exec(&args, &components).await,
        Commands::Health(args) => health::handle_health(&args, &components).await,
        Commands::Usage(args) => usage::handle_usage(&args, &components).await,
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
