use clap::Parser;
use docket::cli::commands;
use docket::cli::{Cli, Commands};
use docket::logging::init_logging;
use docket::DocketError;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("Failed to initialize logging: {e}");
        // Continue without logging rather than aborting the command.
    }

    let dir = cli.dir.as_ref();

    let result = match cli.command {
        Commands::Init { path, force } => commands::init::execute(path, force),
        Commands::Create(args) => commands::create::execute(args, dir),
        Commands::List(args) => commands::list::execute(&args, cli.json, dir),
        Commands::Show { ids } => commands::show::execute(&ids, cli.json, dir),
        Commands::Update(args) => commands::update::execute(&args, dir),
        Commands::Close { ids } => commands::close::execute(&ids, dir),
        Commands::Milestone { command } => commands::milestone::execute(&command, cli.json, dir),
        Commands::Project { command } => commands::project::execute(&command, cli.json, dir),
        Commands::Reindex { force } => commands::reindex::execute(force, dir),
        Commands::Sync(args) => commands::sync::execute(&args, cli.json, dir),
    };

    if let Err(e) = result {
        handle_error(&e);
    }
}

fn handle_error(err: &DocketError) -> ! {
    eprintln!("Error: {err}");
    if let Some(suggestion) = err.suggestion() {
        eprintln!("  hint: {suggestion}");
    }
    std::process::exit(err.exit_code());
}
