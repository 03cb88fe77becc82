use clap::Parser;
use notehub::cli::{
    handle_create, handle_list, handle_prefetch, handle_serve, handle_show, Cli, Commands,
    GlobalOptions,
};
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("notehub=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let global = GlobalOptions {
        api_url: cli.api_url,
        demo: cli.demo,
    };

    let result = match cli.command {
        Commands::Serve { bind } => handle_serve(global, bind),
        Commands::List {
            tag,
            page,
            search,
            json,
        } => handle_list(global, tag, page, search, json),
        Commands::Show { id, json } => handle_show(global, id, json),
        Commands::Create {
            title,
            content,
            tag,
            json,
        } => handle_create(global, title, content, tag, json),
        Commands::Prefetch { location } => handle_prefetch(global, location),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
