use clap::Parser;

use shift::cli::{output, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cli.init_tracing();

    if let Err(e) = cli.execute().await {
        output::failure(format_args!("{:#}", e));
        std::process::exit(1);
    }
}
