use clap::Parser;
use roost_cli::{cli::Cli, commands, logging, output};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;

	if let Err(err) = commands::dispatch(cli).await {
		output::print_error(&err, format);
		std::process::exit(1);
	}
}
