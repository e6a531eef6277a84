mod settings;

pub use settings::{FetchSettings, FormatterSettings, RepositorySettings, StepSettings};
