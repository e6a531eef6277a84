//! fmtmod: versioned, isolated formatter modules resolved and cached on demand.

pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

use std::fs;
use std::path::Path;

use tracing::info;

pub use app::FormatterSettings;
pub use domain::AppError;
pub use services::{CancellationToken, EngineConfiguration, FormatterStep, State};

/// Build the lazy Java formatter step described by a settings file.
///
/// Nothing is resolved until the step formats its first input.
pub fn load_java_step(settings_path: &Path) -> Result<FormatterStep, AppError> {
    let settings = FormatterSettings::load(settings_path)?;
    settings.java_step(CancellationToken::new())
}

/// Format a file in place.
///
/// Returns `true` when the content changed and was written back.
pub fn format_file(step: &FormatterStep, path: &Path) -> Result<bool, AppError> {
    let original = fs::read_to_string(path)?;
    let formatted = step.format(&original)?;
    if formatted == original {
        return Ok(false);
    }
    fs::write(path, &formatted)?;
    info!(step = step.name(), path = %path.display(), "formatted file");
    Ok(true)
}
