//! Compiler configuration

use std::path::PathBuf;

use super::error::{Error, Result};

/// Lowest Java release whose class-file format we can target
pub const MIN_TARGET_JAVA_VERSION: u8 = 5;
/// Highest Java release whose class-file format we can target
pub const MAX_TARGET_JAVA_VERSION: u8 = 8;

/// Configuration settings shared by the emission engine and the driver
#[derive(Debug, Clone)]
pub struct Config {
    /// Target Java release (5..=8); decides the class-file major version
    pub target_java_version: u8,
    /// Emit StackMapTable frames at branch targets
    pub emit_frames: bool,
    /// Trace every emitted instruction through `log::trace!`
    pub debug: bool,
    /// Where the driver writes `.class` files
    pub destination_dir: PathBuf,
    /// Report each written artifact at info level
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_java_version: MAX_TARGET_JAVA_VERSION,
            emit_frames: true,
            debug: false,
            destination_dir: PathBuf::from("turin_classes"),
            verbose: false,
        }
    }
}

impl Config {
    pub fn with_target_java_version(mut self, version: u8) -> Self {
        self.target_java_version = version;
        self
    }

    pub fn with_emit_frames(mut self, emit: bool) -> Self {
        self.emit_frames = emit;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_destination_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.destination_dir = dir.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Class-file major version for the target release (Java 8 -> 52)
    pub fn major_version(&self) -> u16 {
        44 + self.target_java_version as u16
    }

    /// Whether StackMapTable attributes are written for this target.
    /// Class files older than 50 are checked by the inference verifier.
    pub fn frames_enabled(&self) -> bool {
        self.emit_frames && self.major_version() >= 50
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_TARGET_JAVA_VERSION..=MAX_TARGET_JAVA_VERSION).contains(&self.target_java_version) {
            return Err(Error::config_error(format!(
                "unsupported target Java version {} (expected {}..={})",
                self.target_java_version, MIN_TARGET_JAVA_VERSION, MAX_TARGET_JAVA_VERSION
            )));
        }
        // Major 51+ has no fallback to the inference verifier
        if !self.emit_frames && self.major_version() >= 51 {
            return Err(Error::config_error(format!(
                "StackMapTable frames are mandatory for Java {}",
                self.target_java_version
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_java_8() {
        let config = Config::default();
        assert_eq!(config.major_version(), 52);
        assert!(config.frames_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_java_6_without_frames() {
        let config = Config::default().with_target_java_version(6).with_emit_frames(false);
        assert_eq!(config.major_version(), 50);
        assert!(!config.frames_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_frames_mandatory_for_java_7() {
        let config = Config::default().with_target_java_version(7).with_emit_frames(false);
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let config = Config::default().with_target_java_version(11);
        assert!(config.validate().is_err());
        let config = Config::default().with_target_java_version(4);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_java_5_disables_frames() {
        let config = Config::default().with_target_java_version(5);
        assert_eq!(config.major_version(), 49);
        assert!(!config.frames_enabled());
    }
}
