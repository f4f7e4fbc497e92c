use std::io;
use std::path::PathBuf;

use anyhow::Result;
use bikeshare_stats::prompt::Prompter;
use bikeshare_stats::report::render;
use bikeshare_stats::{DataConfig, SourceFormat};
use clap::Parser;

#[derive(Parser)]
#[command(name = "bikeshare-stats", about = "Explore city bikeshare trip statistics")]
struct Cli {
    /// Directory holding one data file per city [env: BIKESHARE_DATA_DIR, default: data]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Format of the city data files [env: BIKESHARE_FORMAT, default: csv]
    #[arg(long, value_enum)]
    format: Option<SourceFormat>,

    /// Print statistics as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut config = DataConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    log::debug!("Using {config:?}");

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout(), config);

    loop {
        let mut city = prompter.choose_city()?;
        prompter.choose_filter(&mut city)?;

        let report = city.summary()?;
        if cli.json {
            prompter.show(&format!("{}\n", serde_json::to_string_pretty(&report)?))?;
        } else {
            prompter.show(&render(&report))?;
        }

        prompter.offer_raw_data(&city)?;
        if !prompter.confirm_rerun()? {
            break;
        }
    }
    Ok(())
}
