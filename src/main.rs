use anyhow::Result;
use clap::Parser;
use repoplot::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.execute()
}
