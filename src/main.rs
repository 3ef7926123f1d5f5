use anyhow::Result;
use clap::Parser;
use studio_launch::cli::{self, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    cli::run(args).await
}
