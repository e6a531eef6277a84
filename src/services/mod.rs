pub mod builtin_engines;
mod cancellation;
mod engine_configuration;
mod engine_linker;
mod formatter_step;
mod isolated_loader;
pub mod java_formatter_step;
mod local_repository;
mod module_fetcher;
mod module_source;
mod resolver_provisioner;

pub use cancellation::CancellationToken;
pub use engine_configuration::{EngineConfiguration, State};
pub use engine_linker::EngineLinker;
pub use formatter_step::{FormatFn, FormatFnFactory, FormatterStep};
pub use isolated_loader::{
    FORMATTER_ENGINE_CONTRACT, IsolatedLoader, LoadedClass, LoaderCache, LoaderId, LoaderKey,
    SharedContract,
};
pub use java_formatter_step::JavaFormatterStep;
pub use local_repository::LocalRepositoryResolver;
pub use module_fetcher::{DEFAULT_FETCH_TIMEOUT_SECS, ModuleFetcher, default_cache_dir};
pub use module_source::ModuleSource;
pub use resolver_provisioner::ResolverProvisioner;
