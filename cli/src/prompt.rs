use std::io::{BufRead, Write};
use std::path::Path;

use crate::CliError;

/// Pick the segmentation prompt: explicit value, then prompt file, then an
/// interactive line from `input`.
///
/// Every source is trimmed; an explicit value that is blank falls through to
/// the next source. The result is never empty.
pub fn resolve_prompt<R, W>(
    explicit: Option<&str>,
    prompt_file: Option<&Path>,
    input: &mut R,
    output: &mut W,
) -> Result<String, CliError>
where
    R: BufRead,
    W: Write,
{
    let prompt = match (explicit.map(str::trim).filter(|p| !p.is_empty()), prompt_file) {
        (Some(prompt), _) => prompt.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|source| CliError::PromptFile {
                path: path.to_path_buf(),
                source,
            })?
            .trim()
            .to_string(),
        (None, None) => {
            write!(output, "Enter segmentation prompt: ")?;
            output.flush()?;
            let mut line = String::new();
            input.read_line(&mut line)?;
            line.trim().to_string()
        }
    };

    if prompt.is_empty() {
        return Err(CliError::EmptyPrompt);
    }
    Ok(prompt)
}
