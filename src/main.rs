use anyhow::Context;
use project_prompt::{
    AliasStore, GeneratorConfig, Invocation, Pipeline, RenderMode, args, format_dry_run,
};
use std::io::Write;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Overrides the `-v`/`--quiet` log filter when set.
const LOG_ENV: &str = "MPP_LOG";

fn main() -> anyhow::Result<()> {
    let tokens: Vec<String> = std::env::args().skip(1).collect();
    let cwd = std::env::current_dir().context("Failed to determine the current directory")?;

    let store = AliasStore::discover(&cwd);

    if args::wants_alias_list(&tokens) {
        let verbosity = tokens.iter().filter(|t| matches!(t.as_str(), "-v" | "--v")).count();
        let quiet = tokens.iter().any(|t| t == "--quiet");
        setup_tracing(u8::try_from(verbosity).unwrap_or(u8::MAX), quiet);
        store.report();
        print!("{}", store.listing());
        return Ok(());
    }

    let expanded = store.expand(&tokens).context("Failed to expand aliases")?;
    let invocation = args::parse(&expanded).context("Invalid arguments")?;

    setup_tracing(invocation.verbosity, invocation.quiet);
    store.report();
    invocation.report();

    if invocation.help {
        print!("{}", args::render_help());
        return Ok(());
    }

    let sink = invocation.output_sink()?;
    let config = build_config(&invocation, cwd)?;

    let pipeline = Pipeline::new(config).context("Failed to create pipeline")?;

    if invocation.dry_run {
        pipeline.preflight()?;
        let files = pipeline
            .dry_run(&invocation)
            .context("Failed to select files")?;
        let mut stdout = std::io::stdout();
        stdout.write_all(format_dry_run(&files).as_bytes())?;
        return Ok(());
    }

    pipeline
        .run(&invocation, &sink, &mut std::io::stdout())
        .context("Prompt generation failed")?;

    Ok(())
}

fn build_config(
    invocation: &Invocation,
    root: std::path::PathBuf,
) -> anyhow::Result<GeneratorConfig> {
    let mut builder = GeneratorConfig::builder()
        .root_dir(root)
        .mode(if invocation.raw {
            RenderMode::Raw
        } else {
            RenderMode::Default
        })
        .role_message(invocation.role_message.clone())
        .extra_context(invocation.extra_context.clone())
        .closing_text(invocation.last_words.clone())
        .include_tree(!invocation.no_tree)
        .quiet(invocation.quiet);

    if let Some(bytes) = invocation.max_size {
        builder = builder.max_file_size(bytes);
    }

    builder.build().context("Failed to build configuration")
}

fn setup_tracing(verbosity: u8, quiet: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| match (quiet, verbosity) {
        (true, _) => EnvFilter::new("project_prompt=error"),
        (false, 0) => EnvFilter::new("project_prompt=info"),
        (false, 1) => EnvFilter::new("project_prompt=debug"),
        (false, _) => EnvFilter::new("project_prompt=trace"),
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
