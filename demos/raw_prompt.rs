//! Raw prompt example
//!
//! Builds a raw prompt from the current repository, with questions and
//! files interleaved in argument order, and prints it to stdout.

use project_prompt::{GeneratorConfig, OutputSink, Pipeline, RenderMode, args};

fn main() -> anyhow::Result<()> {
    let tokens: Vec<String> = [
        "-q", "Review the following manifest:",
        "-i", "Cargo.toml",
        "-q", "Which dependencies could be dropped?",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect();

    let invocation = args::parse(&tokens)?;

    let config = GeneratorConfig::builder()
        .root_dir(".")
        .mode(RenderMode::Raw)
        .build()?;

    let summary =
        Pipeline::new(config)?.run(&invocation, &OutputSink::Stdout, &mut std::io::stdout())?;

    eprintln!("\n{} of {} files included", summary.files_included, summary.files_found);

    Ok(())
}
