use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::fs;
use std::path::PathBuf;

use crate::render::JsonBackend;
use crate::script::Interpreter;

#[derive(Parser)]
#[command(name = "repoplot")]
#[command(about = "Per-author commit statistics charts driven by a plot script")]
#[command(version)]
pub struct Cli {
    #[arg(help = "Path to the plot script", default_value = "repoplot.cfg")]
    pub script: PathBuf,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        eprintln!(
            "{} {}",
            style("Loading script").bold(),
            self.script.display()
        );
        let source = fs::read_to_string(&self.script)
            .with_context(|| format!("Failed to read script '{}'", self.script.display()))?;

        let mut interp = Interpreter::new(&source, JsonBackend::new());
        interp
            .run()
            .with_context(|| format!("Script '{}' failed", self.script.display()))?;
        Ok(())
    }
}
