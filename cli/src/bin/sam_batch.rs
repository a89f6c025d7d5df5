use clap::Parser;
use cli::{download_sample_image, resolve_prompt, sample_stem, RunConfig};
use color_eyre::eyre::Result;
use mask::{BatchReport, BatchRunner, ItemOutcome, ItemReport, SegmentationPort};
use sam3::PythonSegmenter;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Run SAM3 inference over a folder of images.", long_about = None)]
struct Cli {
    /// Folder that contains input images (defaults to ./image)
    #[arg(long)]
    image_dir: Option<PathBuf>,
    /// Text prompt used for segmentation
    #[arg(long)]
    prompt: Option<String>,
    /// Text file whose entire contents are used as the prompt
    #[arg(long)]
    prompt_file: Option<PathBuf>,
    /// Folder to store visualization outputs (defaults to ./results)
    #[arg(long)]
    results_dir: Option<PathBuf>,
    /// Also export each predicted mask as a separate grayscale PNG
    #[arg(long)]
    save_individual_masks: bool,
    /// Download and process a reference sample image after the folder run
    #[arg(long)]
    run_sample: bool,
    /// URL used when --run-sample is enabled (defaults to the SAM demo truck)
    #[arg(long)]
    sample_url: Option<String>,
    /// Python interpreter that runs the worker
    #[arg(long, env = "SAM3_PYTHON")]
    python: Option<String>,
    /// Worker script that loads SAM3 and speaks the line protocol
    #[arg(long, env = "SAM3_WORKER_SCRIPT")]
    worker_script: Option<PathBuf>,
    /// Extra argument passed to the worker script (repeatable)
    #[arg(long = "worker-arg", allow_hyphen_values = true)]
    worker_args: Vec<String>,
    /// Run configuration file (.toml or .json); flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
    /// Print the JSON schema of the configuration file and exit
    #[arg(long)]
    print_config_schema: bool,
    /// Print the JSON schema of the worker protocol and exit
    #[arg(long)]
    print_worker_schema: bool,
}

impl Cli {
    fn to_config(&self) -> RunConfig {
        RunConfig {
            image_dir: self.image_dir.clone(),
            results_dir: self.results_dir.clone(),
            prompt: self.prompt.clone(),
            prompt_file: self.prompt_file.clone(),
            save_individual_masks: self.save_individual_masks.then_some(true),
            run_sample: self.run_sample.then_some(true),
            sample_url: self.sample_url.clone(),
            python: self.python.clone(),
            worker_script: self.worker_script.clone(),
            worker_args: (!self.worker_args.is_empty()).then(|| self.worker_args.clone()),
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    if cli.print_config_schema {
        println!("{}", serde_json::to_string_pretty(&RunConfig::schema())?);
        return Ok(());
    }
    if cli.print_worker_schema {
        println!("{}", serde_json::to_string_pretty(&sam3::protocol::protocol_schema())?);
        return Ok(());
    }

    let file_config = match &cli.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    let config = cli.to_config().merge(file_config);

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let settings = config.into_settings();

    let prompt = resolve_prompt(
        settings.prompt.as_deref(),
        settings.prompt_file.as_deref(),
        &mut std::io::stdin().lock(),
        &mut std::io::stdout(),
    )?;

    let segmenter = match PythonSegmenter::spawn(&settings.worker) {
        Ok(segmenter) => segmenter,
        Err(err) => {
            error!("Error loading model: {}", err);
            error!("You may need to authenticate with Hugging Face to download checkpoints: run `huggingface-cli login`");
            error!("and make sure you have been granted access to https://huggingface.co/facebook/sam3");
            std::process::exit(1);
        }
    };

    let runner = settings
        .configure(BatchRunner::builder(segmenter), prompt)
        .build()?;

    let report = runner.run_directory(&settings.image_dir)?;
    log_report(&report);

    if settings.run_sample {
        run_sample(&runner, &settings.sample_url);
    }

    info!("✅ Done!");
    Ok(())
}

fn run_sample<S: SegmentationPort>(runner: &BatchRunner<S>, url: &str) {
    info!("Downloading sample image for verification...");
    match download_sample_image(url) {
        Ok(image) => {
            let item = runner.process_image(&image, &sample_stem(url));
            log_item(&item);
        }
        Err(err) => warn!("Failed to process sample URL {}: {}", url, err),
    }
}

fn log_item(item: &ItemReport) {
    let kind: &'static str = (&item.outcome).into();
    match &item.outcome {
        ItemOutcome::Done { artifacts, .. } => {
            info!("  {} -> {} ({} file(s))", item.stem, kind, artifacts.len())
        }
        ItemOutcome::SkippedLoadFailure { reason }
        | ItemOutcome::SkippedInferenceFailure { reason }
        | ItemOutcome::SkippedWriteFailure { reason, .. } => {
            warn!("  {} -> {} ({}) at stage {}", item.stem, kind, reason, item.stage)
        }
        _ => info!("  {} -> {}", item.stem, kind),
    }
}

fn log_report(report: &BatchReport) {
    info!(
        "Processed {} of {} image(s); {} skipped",
        report.succeeded(),
        report.len(),
        report.skipped()
    );
    for item in &report.items {
        log_item(item);
    }
}
