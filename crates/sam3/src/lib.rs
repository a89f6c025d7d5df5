//! SAM3 segmentation through a Python worker process.
//!
//! The model itself stays in Python; this crate keeps one worker alive for the
//! whole run and talks to it with the line protocol in [`protocol`].

pub mod error;
pub mod protocol;

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Mutex;

use image::{ImageFormat, RgbImage};
use mask::{MaskError, SegmentationPort, SegmentationResult};
use tracing::{debug, info};

pub use error::{Result, Sam3Error};
use protocol::{WorkerMessage, WorkerRequest};

pub const DEFAULT_PYTHON: &str = "python3";

/// How to launch the worker
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub python: String,
    pub script: PathBuf,
    pub args: Vec<String>,
}

impl WorkerConfig {
    pub fn new<P: Into<PathBuf>>(script: P) -> Self {
        Self {
            python: DEFAULT_PYTHON.to_string(),
            script: script.into(),
            args: Vec::new(),
        }
    }

    pub fn with_python<S: Into<String>>(mut self, python: S) -> Self {
        self.python = python.into();
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

struct Worker {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Worker {
    /// Next protocol message. Any line that is not a protocol message (library
    /// banners, progress dicts) is logged and skipped so that it never takes
    /// the place of a reply.
    fn read_message(&mut self) -> Result<Option<WorkerMessage>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.stdout.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<WorkerMessage>(trimmed) {
                Ok(message) => return Ok(Some(message)),
                Err(_) => debug!("worker: {}", trimmed),
            }
        }
    }

    fn send(&mut self, request: &WorkerRequest) -> Result<()> {
        serde_json::to_writer(&mut self.stdin, request)?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()?;
        Ok(())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// [`SegmentationPort`] backed by a running Python SAM3 worker
pub struct PythonSegmenter {
    worker: Mutex<Worker>,
    model: Option<String>,
}

impl PythonSegmenter {
    /// Start the worker and wait until it reports ready (the model is loaded).
    pub fn spawn(config: &WorkerConfig) -> Result<Self> {
        if !config.script.is_file() {
            return Err(Sam3Error::Initialization(format!(
                "worker script not found: {}",
                config.script.display()
            )));
        }

        info!("Loading SAM3 model via {} {}...", config.python, config.script.display());
        let mut child = Command::new(&config.python)
            .arg(&config.script)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| {
                Sam3Error::Initialization(format!("could not run {}: {}", config.python, err))
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(Sam3Error::Initialization("worker pipes unavailable".to_string()));
        };

        let mut worker = Worker {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        };

        let model = match worker.read_message() {
            Ok(Some(WorkerMessage::Ready { model })) => model,
            Ok(Some(WorkerMessage::Error { message })) => {
                return Err(Sam3Error::Initialization(message));
            }
            Ok(Some(other)) => {
                return Err(Sam3Error::Initialization(format!(
                    "expected ready message, got {:?}",
                    other
                )));
            }
            Ok(None) => {
                return Err(Sam3Error::Initialization(
                    "worker exited before reporting ready".to_string(),
                ));
            }
            Err(err) => return Err(Sam3Error::Initialization(err.to_string())),
        };

        info!("Worker ready (model: {})", model.as_deref().unwrap_or("unknown"));
        Ok(Self {
            worker: Mutex::new(worker),
            model,
        })
    }

    /// Model name announced by the worker, if any
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Send one image and wait for its masks.
    pub fn segment(&self, image: &RgbImage, prompt: &str) -> Result<SegmentationResult> {
        let staged = tempfile::Builder::new()
            .prefix("sam3-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(staged.path(), ImageFormat::Png)?;

        let request = WorkerRequest {
            image_path: staged.path().to_path_buf(),
            prompt: prompt.to_string(),
        };

        let mut worker = self.worker.lock().map_err(|_| Sam3Error::Poisoned)?;
        worker.send(&request)?;

        match worker.read_message()? {
            Some(WorkerMessage::Ok { masks, scores }) => Ok(SegmentationResult::new(masks, scores)),
            Some(WorkerMessage::Error { message }) => Err(Sam3Error::Worker(message)),
            Some(other) => Err(Sam3Error::Protocol(format!("{:?}", other))),
            None => Err(Sam3Error::WorkerExited),
        }
    }
}

impl SegmentationPort for PythonSegmenter {
    fn infer(&self, image: &RgbImage, prompt: &str) -> mask::Result<SegmentationResult> {
        self.segment(image, prompt)
            .map_err(|err| MaskError::Segmentation(err.to_string()))
    }
}
