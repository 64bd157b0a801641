use anyhow::Result;
use clap::Parser;
use log::info;
use mesh_viewer::app::{render_to_file, run_window};
use mesh_viewer::io::config::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mesh_viewer", version)]
#[command(about = "Minimal triangle mesh viewer with a fly camera")]
struct Cli {
    /// Geometry file (`v x y z` / `f i j k` records)
    model: Option<String>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    #[arg(long)]
    title: Option<String>,

    /// Render one frame to this PNG instead of opening a window
    #[arg(short, long, value_name = "PNG")]
    output: Option<PathBuf>,
}

impl Cli {
    /// Loads the configuration file, if any, and applies the flags on top.
    fn into_config(self) -> Result<(Config, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration from '{}'", path.display());
                Config::load(path).map_err(anyhow::Error::msg)?
            }
            None => Config::default(),
        };

        if let Some(model) = self.model {
            config.model.path = Some(model);
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        if let Some(title) = self.title {
            config.window.title = title;
        }
        Ok((config, self.output))
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let (config, output) = Cli::parse().into_config()?;
    match output {
        Some(path) => render_to_file(config, &path),
        None => run_window(config),
    }
}
