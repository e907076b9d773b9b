//! Dry run example
//!
//! Lists the files a prompt would contain without reading any question
//! source or touching the clipboard.

use project_prompt::{GeneratorConfig, Pipeline, args, format_dry_run};

fn main() -> anyhow::Result<()> {
    let tokens: Vec<String> = ["-i", "src/**/*.rs", "-e", "src/main.rs"]
        .iter()
        .map(|s| (*s).to_string())
        .collect();

    let invocation = args::parse(&tokens)?;
    let config = GeneratorConfig::builder().root_dir(".").build()?;

    let pipeline = Pipeline::new(config)?;
    pipeline.preflight()?;

    print!("{}", format_dry_run(&pipeline.dry_run(&invocation)?));

    Ok(())
}
