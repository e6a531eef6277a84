mod artifact_resolver;
mod formatter_engine;
mod provisioner;

pub use artifact_resolver::ArtifactResolver;
pub use formatter_engine::{EngineConstructor, EngineError, FormatterEngine};
pub use provisioner::Provisioner;
