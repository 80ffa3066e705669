//! Script runner: executes one script instance per call.
//!
//! The frame orchestrator hands the runner an opaque [`ScriptHandle`] for
//! every scripted entity, once per editing tick. Whatever goes wrong inside a
//! script stays inside the runner: errors and panics are logged, recorded on
//! the runner's error channel and never returned to the caller.

use bubble_ecs::ScriptHandle;
use std::collections::{BTreeMap, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Errors recorded by a runner. Never propagated to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("no script registered for {0:?}")]
    UnknownScript(ScriptHandle),
    #[error("script {script:?} failed: {message}")]
    Failed {
        script: ScriptHandle,
        message: String,
    },
    #[error("script {script:?} panicked: {message}")]
    Panicked {
        script: ScriptHandle,
        message: String,
    },
}

/// Executes one script instance synchronously.
pub trait ScriptRunner {
    fn on_update(&mut self, script: ScriptHandle);
}

/// Body of a native script. Receives its own handle.
pub type ScriptFn = Box<dyn FnMut(ScriptHandle) -> Result<(), String>>;

/// Keeps only the most recent errors.
const ERROR_CAPACITY: usize = 64;

/// Runner for scripts written as Rust closures.
#[derive(Default)]
pub struct NativeScriptRunner {
    scripts: BTreeMap<ScriptHandle, ScriptFn>,
    next_handle: u32,
    invocations: u64,
    errors: VecDeque<ScriptError>,
}

impl NativeScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a script and return the handle to attach to entities.
    pub fn register(
        &mut self,
        script: impl FnMut(ScriptHandle) -> Result<(), String> + 'static,
    ) -> ScriptHandle {
        let handle = ScriptHandle(self.next_handle);
        self.next_handle += 1;
        self.scripts.insert(handle, Box::new(script));
        tracing::debug!(?handle, "native script registered");
        handle
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Total calls to [`ScriptRunner::on_update`], including failed ones.
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    pub fn errors(&self) -> impl Iterator<Item = &ScriptError> {
        self.errors.iter()
    }

    /// Drain the error channel.
    pub fn take_errors(&mut self) -> Vec<ScriptError> {
        self.errors.drain(..).collect()
    }

    fn run(&mut self, handle: ScriptHandle) -> Result<(), ScriptError> {
        let script = self
            .scripts
            .get_mut(&handle)
            .ok_or(ScriptError::UnknownScript(handle))?;
        match catch_unwind(AssertUnwindSafe(|| script(handle))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(ScriptError::Failed {
                script: handle,
                message,
            }),
            Err(payload) => Err(ScriptError::Panicked {
                script: handle,
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    fn record(&mut self, err: ScriptError) {
        tracing::warn!(error = %err, "script error");
        if self.errors.len() == ERROR_CAPACITY {
            self.errors.pop_front();
        }
        self.errors.push_back(err);
    }
}

impl ScriptRunner for NativeScriptRunner {
    fn on_update(&mut self, script: ScriptHandle) {
        self.invocations += 1;
        if let Err(err) = self.run(script) {
            self.record(err);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn runs_registered_script() {
        let calls = Rc::new(Cell::new(0));
        let mut runner = NativeScriptRunner::new();
        let counter = calls.clone();
        let handle = runner.register(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        runner.on_update(handle);
        runner.on_update(handle);
        assert_eq!(calls.get(), 2);
        assert_eq!(runner.invocations(), 2);
        assert!(runner.errors().next().is_none());
    }

    #[test]
    fn script_receives_its_handle() {
        let seen = Rc::new(Cell::new(None));
        let mut runner = NativeScriptRunner::new();
        runner.register(|_| Ok(()));
        let sink = seen.clone();
        let handle = runner.register(move |h| {
            sink.set(Some(h));
            Ok(())
        });
        runner.on_update(handle);
        assert_eq!(seen.get(), Some(ScriptHandle(1)));
    }

    #[test]
    fn failure_is_recorded_not_returned() {
        let mut runner = NativeScriptRunner::new();
        let handle = runner.register(|_| Err("division by zero".into()));
        runner.on_update(handle);
        assert_eq!(
            runner.take_errors(),
            vec![ScriptError::Failed {
                script: handle,
                message: "division by zero".into()
            }]
        );
        assert!(runner.take_errors().is_empty());
    }

    #[test]
    fn panic_is_contained() {
        let mut runner = NativeScriptRunner::new();
        let handle = runner.register(|_| panic!("boom"));
        runner.on_update(handle);
        runner.on_update(handle);
        let errors = runner.take_errors();
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], ScriptError::Panicked { message, .. } if message == "boom"));
    }

    #[test]
    fn unknown_handle_is_recorded() {
        let mut runner = NativeScriptRunner::new();
        runner.on_update(ScriptHandle(42));
        assert_eq!(
            runner.take_errors(),
            vec![ScriptError::UnknownScript(ScriptHandle(42))]
        );
    }

    #[test]
    fn error_channel_is_bounded() {
        let mut runner = NativeScriptRunner::new();
        for _ in 0..ERROR_CAPACITY + 10 {
            runner.on_update(ScriptHandle(0));
        }
        assert_eq!(runner.errors().count(), ERROR_CAPACITY);
    }
}
