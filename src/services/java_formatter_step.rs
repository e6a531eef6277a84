//! Formatter step for the Java formatter engine.

use std::sync::Arc;

use super::{EngineConfiguration, FormatFn, FormatFnFactory, FormatterStep, State};
use crate::domain::{AppError, CoordinateTemplate, SupportedVersions};
use crate::ports::{FormatterEngine, Provisioner};

pub const NAME: &str = "java formatter";
pub const FORMATTER_CLASS: &str = "dev.fmtmod.java.JavaFormatterImpl";
pub const FORMATTER_METHOD: &str = "format";
pub const VERSIONS: &[&str] = &["4.6.1", "4.6.3", "4.7.0", "4.7.1", "4.7.2"];
pub const DEFAULT_COORDINATES: &[&str] = &["dev.fmtmod:java-formatter:{version}"];

/// Binds the Java formatter implementation class of a resolved module.
///
/// All supported versions expose the same constructor and method, so no
/// per-version adaptation is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaFormatterStep;

impl JavaFormatterStep {
    /// Default configuration: latest supported version, no preferences.
    pub fn create_config(provisioner: impl Provisioner + 'static) -> Result<EngineConfiguration, AppError> {
        EngineConfiguration::new(
            NAME,
            provisioner,
            SupportedVersions::new(VERSIONS)?,
            CoordinateTemplate::new(DEFAULT_COORDINATES.iter().copied())?,
        )
    }

    pub fn create_step(config: EngineConfiguration) -> FormatterStep {
        FormatterStep::create_lazy(NAME, config, JavaFormatterStep)
    }
}

impl FormatFnFactory for JavaFormatterStep {
    fn create(&self, state: &State) -> Result<FormatFn, AppError> {
        let class = state.load_class(FORMATTER_CLASS)?;
        class.require_method(FORMATTER_METHOD)?;
        let engine: Arc<dyn FormatterEngine> = Arc::from(class.new_instance(state.preferences())?);
        let format_fn: FormatFn = Arc::new(move |input: &str| {
            engine.format(input).map_err(|err| AppError::FormattingFailure {
                step: NAME.to_string(),
                input: input.to_string(),
                diagnostic: err.message,
            })
        });
        Ok(format_fn)
    }
}
