mod commands;
mod terminal;

use commands::{CommandLine, Commands, estimate, scan, segments, verify};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose, commands.quiet)?;
    let settings = commands.settings()?;
    let quiet: u8 = commands.quiet;

    let result = match commands.command {
        Commands::Scan { args, no_input } => {
            print::header("starting scan", quiet);
            scan::scan(&settings, &args, no_input, quiet).await
        }
        Commands::Verify { ip, args } => verify::verify(&settings, &args, ip, quiet).await,
        Commands::Estimate { args } => estimate::estimate(&settings, &args, quiet),
        Commands::Segments { args } => segments::segments(&settings, &args, quiet),
    };

    if quiet == 0 {
        print::end_of_program();
    }
    result
}
