//! # Modules and the Application Driver
//!
//! Frame orchestration:
//! ```text
//! startup:   register_types_and_states (all, in order)
//!            initialize                (all, in order; failure unwinds)
//! frame N:   begin_frame
//!            update                    (all, in order, each timed)
//!            end_frame
//! shutdown:  shutdown                  (all, reverse order)
//! ```

use std::time::Instant;

use prototype_core::StateDb;

use crate::assets::Assets;
use crate::error::AppResult;
use crate::profiling::FrameProfiler;

/// Context handed to every module. Owns everything modules share.
#[derive(Default)]
pub struct Platform {
    /// The shared object store
    pub db: StateDb,
    /// Asset name registry
    pub assets: Assets,
    /// Frame section timings
    pub profiler: FrameProfiler,
}

impl Platform {
    /// Creates an empty platform.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// A unit of functionality driven by [`App`].
///
/// Modules share data only through state rows in [`Platform::db`]; any
/// handle read from another module's rows may be stale by the next frame.
pub trait Module {
    /// Name used for logs and profiler sections.
    fn name(&self) -> &'static str;

    /// Registers the types and states this module reads or writes.
    ///
    /// Registration is idempotent, so modules sharing a type each register it.
    fn register_types_and_states(&mut self, db: &mut StateDb);

    /// Creates startup objects and resources.
    ///
    /// # Errors
    ///
    /// Any error aborts startup; modules initialized before this one are shut down.
    fn initialize(&mut self, platform: &mut Platform) -> AppResult<()>;

    /// Advances the module by one frame.
    fn update(&mut self, platform: &mut Platform, delta_time: f64);

    /// Releases what `initialize` created.
    fn shutdown(&mut self, platform: &mut Platform);
}

/// Owns the platform and the modules, in update order.
pub struct App {
    platform: Platform,
    modules: Vec<Box<dyn Module>>,
    running: bool,
}

impl App {
    /// Creates an app with no modules.
    #[must_use]
    pub fn new() -> Self {
        Self {
            platform: Platform::new(),
            modules: Vec::new(),
            running: false,
        }
    }

    /// Appends a module; modules update in the order they were added.
    #[must_use]
    pub fn with_module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Shared context, for inspection between frames.
    #[must_use]
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Mutable shared context.
    pub fn platform_mut(&mut self) -> &mut Platform {
        &mut self.platform
    }

    /// Returns true between a successful [`Self::start`] and [`Self::stop`].
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Registers every module's types and states, then initializes the modules.
    ///
    /// # Errors
    ///
    /// The first initialization error. Modules that were already initialized
    /// are shut down in reverse order before it is returned.
    pub fn start(&mut self) -> AppResult<()> {
        for module in &mut self.modules {
            module.register_types_and_states(&mut self.platform.db);
        }

        for i in 0..self.modules.len() {
            let module = &mut self.modules[i];
            if let Err(err) = module.initialize(&mut self.platform) {
                tracing::error!(module = module.name(), %err, "initialization failed");
                for initialized in self.modules[..i].iter_mut().rev() {
                    initialized.shutdown(&mut self.platform);
                    tracing::info!(module = initialized.name(), "shut down");
                }
                return Err(err);
            }
            tracing::info!(module = module.name(), "initialized");
        }

        self.running = true;
        Ok(())
    }

    /// Runs one frame: every module's update inside a profiler frame.
    pub fn step(&mut self, delta_time: f64) {
        if !self.running {
            tracing::debug!("step on a stopped app");
            return;
        }
        self.platform.profiler.begin_frame();
        for module in &mut self.modules {
            let start = Instant::now();
            module.update(&mut self.platform, delta_time);
            self.platform.profiler.record(module.name(), start.elapsed());
        }
        self.platform.profiler.end_frame();
    }

    /// Shuts every module down in reverse order.
    pub fn stop(&mut self) {
        if !std::mem::replace(&mut self.running, false) {
            return;
        }
        for module in self.modules.iter_mut().rev() {
            module.shutdown(&mut self.platform);
            tracing::info!(module = module.name(), "shut down");
        }
    }

    /// Starts, runs `frames` fixed steps of `delta_time` seconds, and stops.
    ///
    /// # Errors
    ///
    /// Startup errors from [`Self::start`].
    pub fn run(&mut self, frames: u32, delta_time: f64) -> AppResult<()> {
        self.start()?;
        for _ in 0..frames {
            self.step(delta_time);
        }
        self.stop();
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::AppError;

    type Journal = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: &'static str,
        journal: Journal,
        fail_init: bool,
    }

    impl Probe {
        fn new(name: &'static str, journal: &Journal) -> Self {
            Self {
                name,
                journal: Rc::clone(journal),
                fail_init: false,
            }
        }

        fn log(&self, event: &str) {
            self.journal.borrow_mut().push(format!("{}:{event}", self.name));
        }
    }

    impl Module for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn register_types_and_states(&mut self, db: &mut StateDb) {
            db.register_type("Shared", 4);
            self.log("register");
        }

        fn initialize(&mut self, _: &mut Platform) -> AppResult<()> {
            self.log("init");
            if self.fail_init {
                return Err(AppError::ModuleInit {
                    module: self.name,
                    reason: "probe".into(),
                });
            }
            Ok(())
        }

        fn update(&mut self, _: &mut Platform, _: f64) {
            self.log("update");
        }

        fn shutdown(&mut self, _: &mut Platform) {
            self.log("shutdown");
        }
    }

    #[test]
    fn test_lifecycle_order() {
        let journal = Journal::default();
        let mut app = App::new()
            .with_module(Probe::new("a", &journal))
            .with_module(Probe::new("b", &journal));

        app.run(1, 0.1).unwrap();
        assert_eq!(
            *journal.borrow(),
            [
                "a:register", "b:register", "a:init", "b:init", "a:update", "b:update",
                "b:shutdown", "a:shutdown",
            ]
        );
        assert_eq!(app.platform().db.types().count(), 1);
        assert_eq!(app.platform().profiler.frames(), 1);
        assert_eq!(app.platform().profiler.last_frame().len(), 2);
        assert!(!app.is_running());
    }

    #[test]
    fn test_init_failure_unwinds() {
        let journal = Journal::default();
        let mut failing = Probe::new("c", &journal);
        failing.fail_init = true;
        let mut app = App::new()
            .with_module(Probe::new("a", &journal))
            .with_module(Probe::new("b", &journal))
            .with_module(failing);

        let err = app.run(3, 0.1).unwrap_err();
        assert!(matches!(err, AppError::ModuleInit { module: "c", .. }));
        assert_eq!(
            journal.borrow()[3..],
            ["a:init", "b:init", "c:init", "b:shutdown", "a:shutdown"]
        );
        assert!(!app.is_running());

        app.step(0.1);
        assert_eq!(app.platform().profiler.frames(), 0);
    }
}
