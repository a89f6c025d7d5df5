
pub mod prompt;
pub mod sample;

use mask::BatchRunnerBuilder;
use sam3::WorkerConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use prompt::resolve_prompt;
pub use sample::{download_sample_image, sample_stem, DEFAULT_SAMPLE_URL};

pub const DEFAULT_IMAGE_DIR: &str = "./image";
pub const DEFAULT_RESULTS_DIR: &str = "./results";
pub const DEFAULT_WORKER_SCRIPT: &str = "sam3_worker.py";


#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Failed to read prompt file {}: {source}", path.display())]
    PromptFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("A non-empty prompt is required.")]
    EmptyPrompt,
    #[error("Download failed: {0}")]
    Download(String),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}


/// Run configuration loaded from a file; every field is optional so that
/// command-line flags can be layered on top.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Folder that contains input images
    pub image_dir: Option<PathBuf>,
    /// Folder to store visualization outputs
    pub results_dir: Option<PathBuf>,
    /// Text prompt used for segmentation
    pub prompt: Option<String>,
    /// Text file whose entire contents are used as the prompt
    pub prompt_file: Option<PathBuf>,
    /// Also export each mask as a grayscale PNG
    pub save_individual_masks: Option<bool>,
    /// Download and process the sample image after the folder run
    pub run_sample: Option<bool>,
    pub sample_url: Option<String>,
    /// Python interpreter used to run the worker
    pub python: Option<String>,
    pub worker_script: Option<PathBuf>,
    pub worker_args: Option<Vec<String>>,
}

impl RunConfig {
    /// Load RunConfig from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load RunConfig from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load RunConfig from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load RunConfig from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Convert RunConfig to TOML string
    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// JSON schema of the configuration file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RunConfig)
    }

    /// Fill unset fields from `fallback`.
    ///
    /// The prompt and prompt file travel together: if either is set here,
    /// neither is taken from the fallback.
    pub fn merge(self, fallback: RunConfig) -> RunConfig {
        let (prompt, prompt_file) = if self.prompt.is_some() || self.prompt_file.is_some() {
            (self.prompt, self.prompt_file)
        } else {
            (fallback.prompt, fallback.prompt_file)
        };

        RunConfig {
            image_dir: self.image_dir.or(fallback.image_dir),
            results_dir: self.results_dir.or(fallback.results_dir),
            prompt,
            prompt_file,
            save_individual_masks: self.save_individual_masks.or(fallback.save_individual_masks),
            run_sample: self.run_sample.or(fallback.run_sample),
            sample_url: self.sample_url.or(fallback.sample_url),
            python: self.python.or(fallback.python),
            worker_script: self.worker_script.or(fallback.worker_script),
            worker_args: self.worker_args.or(fallback.worker_args),
        }
    }

    /// Apply built-in defaults to every field still unset
    pub fn into_settings(self) -> RunSettings {
        let mut worker = WorkerConfig::new(
            self.worker_script
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKER_SCRIPT)),
        )
        .with_args(self.worker_args.unwrap_or_default());
        if let Some(python) = self.python {
            worker = worker.with_python(python);
        }

        RunSettings {
            image_dir: self.image_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR)),
            results_dir: self
                .results_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR)),
            prompt: self.prompt,
            prompt_file: self.prompt_file,
            save_individual_masks: self.save_individual_masks.unwrap_or(false),
            run_sample: self.run_sample.unwrap_or(false),
            sample_url: self
                .sample_url
                .unwrap_or_else(|| DEFAULT_SAMPLE_URL.to_string()),
            worker,
        }
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub image_dir: PathBuf,
    pub results_dir: PathBuf,
    pub prompt: Option<String>,
    pub prompt_file: Option<PathBuf>,
    pub save_individual_masks: bool,
    pub run_sample: bool,
    pub sample_url: String,
    pub worker: WorkerConfig,
}

impl RunSettings {
    /// Apply the output-related settings to a runner builder
    pub fn configure<S: mask::SegmentationPort>(
        &self,
        builder: BatchRunnerBuilder<S>,
        prompt: String,
    ) -> BatchRunnerBuilder<S> {
        builder
            .prompt(prompt)
            .results_dir(&self.results_dir)
            .save_individual_masks(self.save_individual_masks)
    }
}
