mod accessory_file;
mod commands;
mod input;
mod options;
mod terminal;

use commands::{CommandLine, discover};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(&commands.log_file, commands.verbose)?;

    discover::discover(&commands).await
}
