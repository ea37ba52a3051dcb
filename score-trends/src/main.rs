use anyhow::Result;
use clap::Parser;
use score_trends::{Args, helpers::setup_logging, run_report};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args)?;
    let mut writer = std::io::stdout();
    run_report(args, &mut writer)
}
