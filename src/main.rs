use clap::Parser;
use securevault::cli::{commands, output, Cli, Commands, Context};
use securevault::errors::Result;

fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr, filtered by `SECUREVAULT_LOG` (default: warn).
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SECUREVAULT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    // Completions need no project state.
    if let Commands::Completions { shell } = cli.command {
        return commands::completions::execute(shell);
    }

    let ctx = Context::load(&cli)?;

    match cli.command {
        Commands::Init => commands::init::execute(&ctx),
        Commands::Verify => commands::verify::execute(&ctx),
        Commands::Add { record } => commands::add::execute(&ctx, record),
        Commands::List { kind } => commands::list::execute(&ctx, kind),
        Commands::Show { kind, id } => commands::show::execute(&ctx, kind, id),
        Commands::Delete { kind, id, force } => commands::delete::execute(&ctx, kind, id, force),
        Commands::Export { ref output } => commands::export::execute(&ctx, output),
        Commands::Import { ref file } => commands::import_cmd::execute(&ctx, file),
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
