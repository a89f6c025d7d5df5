use thiserror::Error;

#[derive(Error, Debug)]
pub enum Sam3Error {
    #[error("Failed to start segmentation worker: {0}")]
    Initialization(String),
    #[error("Worker reported an error: {0}")]
    Worker(String),
    #[error("Unexpected worker message: {0}")]
    Protocol(String),
    #[error("Worker process exited unexpectedly")]
    WorkerExited,
    #[error("Worker lock poisoned by a previous panic")]
    Poisoned,
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Sam3Error>;
