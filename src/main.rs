//! musicgen-batch: generate music from a file of text prompts.

use musicgen_batch::cli::Cli;
use musicgen_batch::config::{RuntimeOptions, Settings};
use musicgen_batch::error::Result;
use musicgen_batch::generation::{ensure_output_dir, run_batch};
use musicgen_batch::models::{ensure_models, load_sessions};
use musicgen_batch::prompts::{read_prompts, write_sample_prompts};
use musicgen_batch::types::GenerationParams;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let settings = Settings::from_env();

    let device = settings.device.resolve();
    eprintln!("Using device: {}", device);

    let model_dir = cli.model_directory(&settings);
    eprintln!("Loading MusicGen model: {}...", cli.model);
    ensure_models(&model_dir, cli.model)?;
    let runtime = RuntimeOptions::for_device(device, settings.threads);
    let mut models = load_sessions(&model_dir, cli.model, &runtime)?;

    if cli.duration > 30 {
        eprintln!(
            "Warning: MusicGen is trained for clips up to 30s; quality may degrade at {}s.",
            cli.duration
        );
    }
    models.set_generation_params(GenerationParams::new(cli.duration, cli.guidance));

    ensure_output_dir(&cli.output)?;

    if !cli.prompts.exists() {
        eprintln!(
            "Error: {} not found. Creating sample file...",
            cli.prompts.display()
        );
        write_sample_prompts(&cli.prompts)?;
        eprintln!(
            "Sample prompts created in {}. Edit and run again.",
            cli.prompts.display()
        );
        return Ok(());
    }

    let prompts = read_prompts(&cli.prompts)?;
    run_batch(&mut models, &prompts, &cli.output)?;
    Ok(())
}
