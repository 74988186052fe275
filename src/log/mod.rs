//! Diagnostic logging for the integrator, the quantizer, and the runner. This is not to be
//! confused with _reports_, the CSV files holding a run's numeric output.
//!
//! This module (re)exports the five logging macros: `error!`, `warn!`, `info!`, `debug!` and
//! `trace!`, where `error!` represents the highest-priority log messages and `trace!` the lowest.
//!
//! Logging is _disabled_ by default. The `sir-quant` binary enables it with `--log-level <spec>`
//! or `-v`/`-vv`/`-vvv`. From code, use:
//!
//!  - `enable_logging()`: turns on all log messages
//!  - `disable_logging()`: turns off all log messages
//!  - `set_log_level(level: LevelFilter)`: enables only log messages with priority at least `level`
//!
//! Per-module filtering is configured with `set_module_filter()` / `set_module_filters()` and
//! `remove_module_filter()`:
//!
//! ```rust
//! use sir_quant::log::{set_module_filter, set_log_level, LevelFilter};
//!
//! // Enable `info` log messages globally...
//! set_log_level(LevelFilter::Info);
//! // ...but show every rejected integration step.
//! set_module_filter("sir_quant::integrator", LevelFilter::Trace);
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::SirError;
#[cfg(feature = "logging")]
use log4rs::Handle;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// Level filter for the messages emitted from one module path (e.g. `"sir_quant::integrator"`).
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    /// The module path this configuration applies to
    module: String,
    /// The maximum log level for this module path
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// Holds logging configuration: the filter levels of modules and a handle to the global logger.
///
/// Because loggers are globally installed, only one instance of this struct exists. The public
/// API are free functions which fetch the singleton and call the appropriate member function.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// The level filter for modules without an explicitly set filter. A global filter level of
    /// `LevelFilter::Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    /// Handle to the `log4rs` logger.
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations: HashMap::new(),

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    pub(in crate::log) fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration was mutated, false otherwise.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                let module_config = entry.get_mut();
                if module_config.level == level {
                    return false;
                }
                module_config.level = level;
            }
            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    pub(in crate::log) fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut mutated = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module, *level);
        }
        if mutated {
            self.set_config();
        }
    }

    pub(in crate::log) fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

// The public API

/// Enables the logger with no global level filter / full logging. Equivalent to
/// `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level. A global filter level of `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filters(&[(module_path, level_filter)]);
}

/// Removes a module-specific level filter for the given module path. The global level filter will
/// apply to the module.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

/// Sets the level filters for a set of modules. Use this instead of `set_module_filter()` to set
/// filters in bulk.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

/// A parsed `--log-level` argument: an optional global level plus per-module levels.
#[derive(Debug, Default, PartialEq)]
pub struct LogSpec {
    pub global: Option<LevelFilter>,
    pub modules: Vec<(String, LevelFilter)>,
}

impl FromStr for LogSpec {
    type Err = SirError;

    /// Parses `"info"`, `"sir_quant=trace"`, or a comma-separated mix such as
    /// `"sir_quant::integrator=trace,warn"`. Level names are case-insensitive.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let parse_level = |text: &str| {
            LevelFilter::from_str(text.trim())
                .map_err(|_| SirError::Config(format!("unknown log level `{}`", text.trim())))
        };
        let mut parsed = LogSpec::default();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((module, level)) => {
                    let module = module.trim();
                    if module.is_empty() {
                        return Err(SirError::Config(format!(
                            "missing module name in `{entry}`"
                        )));
                    }
                    parsed.modules.push((module.to_string(), parse_level(level)?));
                }
                None => parsed.global = Some(parse_level(entry)?),
            }
        }
        Ok(parsed)
    }
}

impl LogSpec {
    /// Installs this specification. Modules named without a global level enable logging for
    /// those modules only.
    pub fn apply(&self) {
        set_log_level(self.global.unwrap_or(LevelFilter::Off));
        let filters: Vec<(&str, LevelFilter)> = self
            .modules
            .iter()
            .map(|(module, level)| (module.as_str(), *level))
            .collect();
        set_module_filters(&filters);
        for (module, level) in &self.modules {
            info!("Logging enabled for {module} at level {level}");
        }
    }
}

/// Fetches a mutable reference to the global `LogConfiguration`.
fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{LazyLock, Mutex};

    // Force logging tests to run serially for consistent behavior.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn test_set_log_level() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Error);
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Error);
            error!("test_set_log_level: global set to error");
            trace!("test_set_log_level: NOT EMITTED");
        }
        enable_logging();
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Trace);
            assert_eq!(log::max_level(), LevelFilter::Trace);
        }
        disable_logging();
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Off);
    }

    #[test]
    fn test_set_remove_module_filters() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_module_filters(&[
            ("sir_quant::integrator", LevelFilter::Trace),
            ("sir_quant::quantizer", LevelFilter::Warn),
        ]);
        {
            let config = get_log_configuration();
            assert_eq!(
                config.module_configurations.get("sir_quant::integrator"),
                Some(&("sir_quant::integrator", LevelFilter::Trace).into())
            );
            assert_eq!(
                config.module_configurations.get("sir_quant::quantizer"),
                Some(&("sir_quant::quantizer", LevelFilter::Warn).into())
            );
        }

        remove_module_filter("sir_quant::integrator");
        remove_module_filter("sir_quant::quantizer");
        {
            let config = get_log_configuration();
            assert!(!config
                .module_configurations
                .contains_key("sir_quant::integrator"));
            assert!(!config
                .module_configurations
                .contains_key("sir_quant::quantizer"));
        }
    }

    #[test]
    fn test_parse_log_spec() {
        let spec: LogSpec = "info".parse().unwrap();
        assert_eq!(spec.global, Some(LevelFilter::Info));
        assert!(spec.modules.is_empty());

        let spec: LogSpec = "sir_quant::integrator=Trace, warn".parse().unwrap();
        assert_eq!(spec.global, Some(LevelFilter::Warn));
        assert_eq!(
            spec.modules,
            vec![("sir_quant::integrator".to_string(), LevelFilter::Trace)]
        );

        assert!("loud".parse::<LogSpec>().is_err());
        assert!("=debug".parse::<LogSpec>().is_err());
        assert_eq!("".parse::<LogSpec>().unwrap(), LogSpec::default());
    }
}
