use clap::Parser;
use eaip_importer::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    // Create async runtime and run the main command logic
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    match runtime.block_on(commands::run(args)) {
        Ok(()) => process::exit(0),
        Err(error) => {
            // Error occurred - print to stderr and exit with error code
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("EAIP Importer - AIRAC Chart Library Builder");
    println!("===========================================");
    println!();
    println!("Import vendor EAIP chart archives (ZIP) into a normalized library of");
    println!("per-airport, categorized and indexed PDF charts, one folder per AIRAC cycle.");
    println!();
    println!("USAGE:");
    println!("    eaip-importer <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    import      Import an EAIP archive into the chart library (main command)");
    println!("    periods     List the imported AIRAC cycles");
    println!("    airports    List the airports of a cycle with their chart counts");
    println!("    charts      List or search the charts of an airport (or ENROUTE)");
    println!("    export      Copy one chart document out of the library");
    println!("    reindex     Re-run categorization and indexing on an imported cycle");
    println!("    inspect     List the contents of an archive without importing it");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Import an archive into the default data directory:");
    println!("    eaip-importer import EAIP2025-11.zip");
    println!();
    println!("    # Import a password protected archive into a custom library:");
    println!("    eaip-importer --data-dir /srv/charts import cycle.zip --password secret");
    println!();
    println!("    # Find the ILS approaches of runway 36R at ZBAA:");
    println!("    eaip-importer charts ZBAA --search 36R");
    println!();
    println!("    # Export chart 3 of ZBAA:");
    println!("    eaip-importer export ZBAA 3 --output zbaa-3.pdf");
    println!();
    println!("For detailed help on any command, use:");
    println!("    eaip-importer <COMMAND> --help");
}
