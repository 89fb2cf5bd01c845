//! Script execution with cached device contexts and windows
//!
//! Creating a device context and a framebuffer window is far more expensive than
//! building pipelines, and consecutive scripts usually ask for the same device
//! configuration and framebuffer. The [`Executor`] keeps at most one context and one
//! window alive between scripts and only rebuilds them when the next script is not
//! compatible with them. Pipelines are rebuilt for every script.

use std::fmt;
use vkscript_config::{PipelineSet, Requirements, Script, TestResult, WindowFormat, requirements::DeviceCapabilities};

/// Device, window and pipeline creation for one graphics API
pub trait Backend {
    /// A device supplied by the caller instead of searched for
    type External: DeviceCapabilities;
    /// Logical device with its queue
    type Context;
    /// Offscreen framebuffer
    type Window;
    /// The built pipelines of one script
    type Pipelines;
    type Error: fmt::Display;

    /// Searches for a device satisfying `requirements` and creates a context on it
    fn create_context(&mut self, requirements: &Requirements) -> Result<Self::Context, Self::Error>;

    /// Creates a context on a caller-supplied device already checked against `requirements`
    fn wrap_external(&mut self, device: &Self::External, requirements: &Requirements) -> Result<Self::Context, Self::Error>;

    /// Creates a framebuffer with the given formats and size
    fn create_window(&mut self, context: &Self::Context, format: &WindowFormat) -> Result<Self::Window, Self::Error>;

    /// Builds one pipeline per distinct key of `pipeline_set`
    fn build_pipelines(&mut self, context: &Self::Context, window: &Self::Window, script: &Script, pipeline_set: &PipelineSet) -> Result<Self::Pipelines, Self::Error>;
}

/// Status of a cached resource with respect to the next script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// Nothing is cached
    Absent,
    /// The cached resource can be reused
    Compatible,
    /// The cached resource must be released and recreated
    Stale,
}

/// What the executor does with its cached resources for one script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheDecision {
    pub reuse_context: bool,
    pub reuse_window: bool,
}

/// Resources handed to the test body of one script
pub struct Resources<'a, B: Backend> {
    pub context: &'a B::Context,
    pub window: &'a B::Window,
    pub pipelines: &'a B::Pipelines,
    pub pipeline_set: &'a PipelineSet,
}

struct CachedContext<C> {
    handle: C,
    /// Requirements the context was created for, which are also what it enables
    requirements: Requirements,
}

struct CachedWindow<W> {
    handle: W,
    format: WindowFormat,
}

/// Runs scripts in sequence, reusing contexts and windows where possible
pub struct Executor<B: Backend> {
    backend: B,
    external: Option<B::External>,
    context: Option<CachedContext<B::Context>>,
    window: Option<CachedWindow<B::Window>>,
    last_decision: Option<CacheDecision>,
}

impl<B: Backend> Executor<B> {
    /// Creates an executor that searches for a suitable device per context
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            external: None,
            context: None,
            window: None,
            last_decision: None,
        }
    }

    /// Creates an executor that always uses a caller-supplied device
    ///
    /// Scripts whose requirements the device does not meet are skipped rather than
    /// failed, since the device choice is the caller's.
    pub fn with_external_device(backend: B, device: B::External) -> Self {
        Self {
            external: Some(device),
            ..Self::new(backend)
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Cache decision taken for the most recently executed script
    pub fn last_decision(&self) -> Option<CacheDecision> {
        self.last_decision
    }

    /// Returns true if a context is currently cached
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Returns true if a window is currently cached
    pub fn has_window(&self) -> bool {
        self.window.is_some()
    }

    /// State of the cached context for a script with `requirements`
    pub fn context_state(&self, requirements: &Requirements) -> ResourceState {
        match &self.context {
            None => ResourceState::Absent,
            Some(cached) if cached.requirements == *requirements => ResourceState::Compatible,
            Some(_) => ResourceState::Stale,
        }
    }

    /// State of the cached window for a script with framebuffer `format`
    pub fn window_state(&self, format: &WindowFormat) -> ResourceState {
        match &self.window {
            None => ResourceState::Absent,
            Some(cached) if cached.format.is_compatible_with(format) => ResourceState::Compatible,
            Some(_) => ResourceState::Stale,
        }
    }

    /// Decides which cached resources a script can reuse
    ///
    /// A window belongs to its context, so a stale context also discards the window.
    pub fn decide(&self, script: &Script) -> CacheDecision {
        let reuse_context = self.context_state(script.requirements()) == ResourceState::Compatible;
        let reuse_window = reuse_context && self.window_state(script.window_format()) == ResourceState::Compatible;

        CacheDecision { reuse_context, reuse_window }
    }

    /// Releases the cached window and context
    pub fn release(&mut self) {
        self.window = None;
        self.context = None;
    }

    fn ensure_context(&mut self, requirements: &Requirements) -> Result<(), TestResult> {
        if self.context.is_some() {
            return Ok(());
        }

        let created = match &self.external {
            Some(device) => {
                if let Err(e) = requirements.check(device) {
                    tracing::warn!("skipping script, external device does not meet its requirements: {e}");
                    return Err(TestResult::Skip);
                }
                self.backend.wrap_external(device, requirements)
            }
            None => self.backend.create_context(requirements),
        };

        match created {
            Ok(handle) => {
                tracing::info!(extensions = ?requirements.extensions(), "created device context");
                self.context = Some(CachedContext {
                    handle,
                    requirements: requirements.clone(),
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!("failed to create device context: {e}");
                Err(TestResult::Fail)
            }
        }
    }

    fn ensure_window(&mut self, format: &WindowFormat) -> Result<(), TestResult> {
        if self.window.is_some() {
            return Ok(());
        }

        let Some(context) = &self.context else {
            unreachable!("window requested without a context");
        };

        match self.backend.create_window(&context.handle, format) {
            Ok(handle) => {
                tracing::info!(color = %format.color_format, width = format.width, height = format.height, "created window");
                self.window = Some(CachedWindow { handle, format: format.clone() });
                Ok(())
            }
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                Err(TestResult::Fail)
            }
        }
    }

    /// Prepares the context, window and pipelines of a script and runs its test body
    ///
    /// # Arguments
    /// * `script` - The script to run
    /// * `run` - Test body, called only when every resource could be prepared
    ///
    /// # Returns
    /// Skip when an external device lacks a capability, Fail when a resource cannot be
    /// created, otherwise the verdict of `run`
    pub fn execute<F>(&mut self, script: &Script, run: F) -> TestResult
    where
        F: FnOnce(&Script, Resources<'_, B>) -> TestResult,
    {
        let decision = self.decide(script);
        self.last_decision = Some(decision);

        if !decision.reuse_context && self.context.is_some() {
            tracing::debug!("requirements changed, releasing context");
            self.release();
        } else if !decision.reuse_window && self.window.is_some() {
            tracing::debug!("framebuffer format changed, releasing window");
            self.window = None;
        } else if decision.reuse_window {
            tracing::debug!("reusing context and window");
        }

        if let Err(result) = self.ensure_context(script.requirements()) {
            return result;
        }
        if let Err(result) = self.ensure_window(script.window_format()) {
            return result;
        }

        let (Some(context), Some(window)) = (&self.context, &self.window) else {
            unreachable!("context and window were just prepared");
        };

        let pipeline_set = PipelineSet::new(script);
        let pipelines = match self.backend.build_pipelines(&context.handle, &window.handle, script, &pipeline_set) {
            Ok(pipelines) => pipelines,
            Err(e) => {
                tracing::error!("failed to build pipelines: {e}");
                return TestResult::Fail;
            }
        };
        tracing::debug!(pipelines = pipeline_set.len(), "built pipelines");

        run(
            script,
            Resources {
                context: &context.handle,
                window: &window.handle,
                pipelines: &pipelines,
                pipeline_set: &pipeline_set,
            },
        )
    }

    /// Runs a batch of scripts and combines their verdicts
    ///
    /// # Arguments
    /// * `scripts` - Scripts in execution order
    /// * `fail_fast` - Stop at the first failing script
    /// * `run` - Test body called for every script that could be prepared
    pub fn run_batch<'s, F>(&mut self, scripts: impl IntoIterator<Item = &'s Script>, fail_fast: bool, mut run: F) -> TestResult
    where
        F: FnMut(&Script, Resources<'_, B>) -> TestResult,
    {
        let mut overall = TestResult::Pass;

        for (index, script) in scripts.into_iter().enumerate() {
            let result = self.execute(script, &mut run);
            tracing::info!(script = index, %result, "script finished");
            overall = overall.merge(result);

            if fail_fast && result == TestResult::Fail {
                tracing::warn!("stopping batch after first failure");
                break;
            }
        }

        overall
    }
}
