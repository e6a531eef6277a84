//! Lazily materialized formatter steps.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use super::{EngineConfiguration, State};
use crate::domain::AppError;

/// The callable a step formats with once materialized.
pub type FormatFn = Arc<dyn Fn(&str) -> Result<String, AppError> + Send + Sync>;

/// Binds a resolved [`State`] to a [`FormatFn`].
pub trait FormatFnFactory: Send + Sync {
    fn create(&self, state: &State) -> Result<FormatFn, AppError>;
}

impl<F> FormatFnFactory for F
where
    F: Fn(&State) -> Result<FormatFn, AppError> + Send + Sync,
{
    fn create(&self, state: &State) -> Result<FormatFn, AppError> {
        self(state)
    }
}

enum Materialization {
    Unmaterialized,
    Materializing,
    Ready(FormatFn),
    FailedRetryable(String),
}

impl fmt::Debug for Materialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Materialization::Unmaterialized => write!(f, "Unmaterialized"),
            Materialization::Materializing => write!(f, "Materializing"),
            Materialization::Ready(_) => write!(f, "Ready"),
            Materialization::FailedRetryable(reason) => write!(f, "FailedRetryable({reason})"),
        }
    }
}

/// A named step that resolves its engine on first use.
///
/// Concurrent first calls wait for a single materialization. Failures are
/// returned to the caller and the next call starts over.
pub struct FormatterStep {
    name: String,
    config: EngineConfiguration,
    factory: Box<dyn FormatFnFactory>,
    state: Mutex<Materialization>,
    settled: Condvar,
}

impl fmt::Debug for FormatterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterStep")
            .field("name", &self.name)
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl FormatterStep {
    /// Wrap a configuration without resolving anything.
    pub fn create_lazy(
        name: impl Into<String>,
        config: EngineConfiguration,
        factory: impl FormatFnFactory + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            factory: Box::new(factory),
            state: Mutex::new(Materialization::Unmaterialized),
            settled: Condvar::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configuration(&self) -> &EngineConfiguration {
        &self.config
    }

    pub fn is_materialized(&self) -> bool {
        matches!(*self.state.lock(), Materialization::Ready(_))
    }

    /// Reason the most recent materialization failed, if it did.
    pub fn last_failure(&self) -> Option<String> {
        match &*self.state.lock() {
            Materialization::FailedRetryable(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Fingerprint of the state the configuration currently resolves to.
    pub fn state_fingerprint(&self) -> Result<String, AppError> {
        self.config.get()?.fingerprint()
    }

    pub fn format(&self, input: &str) -> Result<String, AppError> {
        let format_fn = self.materialize()?;
        format_fn(input).map_err(|err| match err {
            AppError::FormattingFailure { .. } => err,
            other => AppError::FormattingFailure {
                step: self.name.clone(),
                input: input.to_string(),
                diagnostic: other.to_string(),
            },
        })
    }

    fn materialize(&self) -> Result<FormatFn, AppError> {
        let mut state = self.state.lock();
        loop {
            if let Materialization::Ready(format_fn) = &*state {
                return Ok(format_fn.clone());
            }
            if matches!(*state, Materialization::Materializing) {
                self.settled.wait(&mut state);
                continue;
            }
            break;
        }
        *state = Materialization::Materializing;
        drop(state);

        let mut guard = UnwindGuard { step: self, armed: true };
        debug!(step = %self.name, "materializing formatter");
        let outcome = self.config.get().and_then(|resolved| self.factory.create(&resolved));
        guard.armed = false;

        let mut state = self.state.lock();
        match &outcome {
            Ok(format_fn) => *state = Materialization::Ready(format_fn.clone()),
            Err(err) => {
                warn!(step = %self.name, error = %err, "materialization failed; will retry on next use");
                *state = Materialization::FailedRetryable(err.to_string());
            }
        }
        self.settled.notify_all();
        outcome
    }
}

/// Returns the step to a retryable state if the factory panics mid-materialization.
struct UnwindGuard<'a> {
    step: &'a FormatterStep,
    armed: bool,
}

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.step.state.lock() =
                Materialization::FailedRetryable("materialization panicked".to_string());
            self.step.settled.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::domain::{CoordinateTemplate, SupportedVersions};
    use crate::ports::FormatterEngine;
    use crate::services::builtin_engines::{IMPORT_ORDER, TRAILING_WHITESPACE};
    use crate::services::{EngineLinker, LoaderCache};
    use crate::testing::{FlakyProvisioner, ModuleRepository};

    fn configuration(repo: &ModuleRepository, failures: usize) -> (EngineConfiguration, Arc<AtomicUsize>) {
        repo.publish(
            "dev.test:engine:1.0.0",
            &[("dev.test.Trim", TRAILING_WHITESPACE), ("dev.test.Imports", IMPORT_ORDER)],
        );
        let provisioner = FlakyProvisioner::new(repo.resolver(), failures);
        let calls = provisioner.counter();
        let config = EngineConfiguration::new(
            "test",
            provisioner,
            SupportedVersions::new(&["1.0.0"]).unwrap(),
            CoordinateTemplate::new(["dev.test:engine:{version}"]).unwrap(),
        )
        .unwrap()
        .with_loader_cache(Arc::new(LoaderCache::new(EngineLinker::with_builtins())));
        (config, calls)
    }

    fn factory(class: &'static str, created: Arc<AtomicUsize>) -> impl FormatFnFactory {
        move |state: &State| -> Result<FormatFn, AppError> {
            created.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            let engine: Arc<dyn FormatterEngine> =
                Arc::from(state.load_class(class)?.new_instance(state.preferences())?);
            let format_fn: FormatFn = Arc::new(move |input: &str| {
                engine.format(input).map_err(|err| AppError::FormattingFailure {
                    step: "test".to_string(),
                    input: input.to_string(),
                    diagnostic: err.message,
                })
            });
            Ok(format_fn)
        }
    }

    #[test]
    fn creation_does_not_resolve() {
        let repo = ModuleRepository::new();
        let (config, calls) = configuration(&repo, 0);
        let created = Arc::new(AtomicUsize::new(0));

        let step = FormatterStep::create_lazy("trim", config, factory("dev.test.Trim", created.clone()));
        assert_eq!(step.name(), "trim");
        assert_eq!(step.configuration().name(), "test");
        assert!(!step.is_materialized());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn materializes_once_and_reuses() {
        let repo = ModuleRepository::new();
        let (config, calls) = configuration(&repo, 0);
        let created = Arc::new(AtomicUsize::new(0));
        let step = FormatterStep::create_lazy("trim", config, factory("dev.test.Trim", created.clone()));

        assert_eq!(step.format("a \nb\t\n").unwrap(), "a\nb\n");
        assert_eq!(step.format("c  ").unwrap(), "c");
        assert!(step.is_materialized());
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_use_materializes_once() {
        let repo = ModuleRepository::new();
        let (config, _calls) = configuration(&repo, 0);
        let created = Arc::new(AtomicUsize::new(0));
        let step = FormatterStep::create_lazy("trim", config, factory("dev.test.Trim", created.clone()));

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| assert_eq!(step.format("x ").unwrap(), "x"));
            }
        });
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_failure_is_retried() {
        let repo = ModuleRepository::new();
        let (config, calls) = configuration(&repo, 1);
        let created = Arc::new(AtomicUsize::new(0));
        let step = FormatterStep::create_lazy("trim", config, factory("dev.test.Trim", created.clone()));

        let err = step.format("x ").unwrap_err();
        assert!(err.is_retryable());
        assert!(!step.is_materialized());
        assert!(step.last_failure().is_some());

        assert_eq!(step.format("x ").unwrap(), "x");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(step.last_failure().is_none());
    }

    #[test]
    fn panicking_factory_leaves_step_retryable() {
        let repo = ModuleRepository::new();
        let (config, _calls) = configuration(&repo, 0);
        let attempts = Arc::new(AtomicUsize::new(0));
        let created = Arc::new(AtomicUsize::new(0));
        let inner = factory("dev.test.Trim", created.clone());
        let counter = attempts.clone();
        let step = FormatterStep::create_lazy("trim", config, move |state: &State| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("engine blew up");
            }
            inner.create(state)
        });

        assert!(catch_unwind(AssertUnwindSafe(|| step.format("x "))).is_err());
        assert_eq!(step.last_failure().as_deref(), Some("materialization panicked"));
        assert_eq!(step.format("x ").unwrap(), "x");
    }

    #[test]
    fn engine_errors_surface_as_formatting_failures() {
        let repo = ModuleRepository::new();
        let (config, _calls) = configuration(&repo, 0);
        let created = Arc::new(AtomicUsize::new(0));
        let step =
            FormatterStep::create_lazy("imports", config, factory("dev.test.Imports", created.clone()));

        match step.format("import java.util.List\n").unwrap_err() {
            AppError::FormattingFailure { input, diagnostic, .. } => {
                assert_eq!(input, "import java.util.List\n");
                assert!(diagnostic.contains("malformed import"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The function stays cached after an engine error.
        assert!(step.is_materialized());
        assert_eq!(step.format("import b.B;\nimport a.A;").unwrap(), "import a.A;\nimport b.B;");
    }

    #[test]
    fn missing_class_fails_materialization() {
        let repo = ModuleRepository::new();
        let (config, _calls) = configuration(&repo, 0);
        let created = Arc::new(AtomicUsize::new(0));
        let step = FormatterStep::create_lazy("absent", config, factory("dev.test.Absent", created));

        assert!(matches!(step.format("x"), Err(AppError::InvalidUserArgument(_))));
        assert!(!step.is_materialized());
    }
}
