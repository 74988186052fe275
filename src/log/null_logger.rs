/*!

A "logger" that does not output anything anywhere but satisfies the public API. Used when the
`logging` feature is disabled.

*/

use crate::log::LogConfiguration;

impl LogConfiguration {
    /// Applies the level filters to the `log` facade only.
    pub(in crate::log) fn set_config(&mut self) {
        let max_level = self
            .module_configurations
            .values()
            .map(|module_config| module_config.level)
            .fold(self.global_log_level, std::cmp::max);
        log::set_max_level(max_level);
    }
}
