use std::io::Read;
use std::path::Path;
use std::time::Duration;

use image::RgbImage;
use tracing::info;

use crate::CliError;

/// Reference image used by `--run-sample`
pub const DEFAULT_SAMPLE_URL: &str =
    "https://raw.githubusercontent.com/facebookresearch/segment-anything/main/notebooks/images/truck.jpg";

pub const SAMPLE_TIMEOUT: Duration = Duration::from_secs(60);

/// File stem of the URL path, ignoring any query or fragment; `sample` when empty.
pub fn sample_stem(url: &str) -> String {
    let path = url.split(|c| c == '?' || c == '#').next().unwrap_or(url);
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("sample")
        .to_string()
}

/// Fetch and decode an image over HTTP(S).
pub fn download_sample_image(url: &str) -> Result<RgbImage, CliError> {
    info!("Downloading sample image from {}", url);
    let agent = ureq::AgentBuilder::new().timeout(SAMPLE_TIMEOUT).build();
    let response = agent
        .get(url)
        .call()
        .map_err(|err| CliError::Download(err.to_string()))?;

    let mut bytes = Vec::new();
    response.into_reader().read_to_end(&mut bytes)?;
    Ok(image::load_from_memory(&bytes)?.to_rgb8())
}
