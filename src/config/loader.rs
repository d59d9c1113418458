//! Reading an [`AxisConfig`] from TOML (std only).

use core::fmt::Write;
use std::path::Path;

use crate::error::{ConfigError, Error, Result};

use super::validation::validate_config;
use super::AxisConfig;

type Message = heapless::String<128>;

/// Read, parse and validate the axis configuration at `path`.
///
/// # Errors
///
/// `IoError` when the file cannot be read, otherwise as [`parse_config`].
///
/// ```rust,ignore
/// let config = tilt_stepper::load_config("demos/tilt_axis.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AxisConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(ConfigError::IoError(bounded(format_args!(
            "{}: {}",
            path.display(),
            e
        ))))
    })?;

    parse_config(&content)
}

/// Parse and validate an axis configuration.
///
/// Omitted tables and keys keep the firmware defaults. Parse errors carry
/// the 1-based line of the offending input.
///
/// # Errors
///
/// `ParseError` for malformed TOML or out-of-range enums, otherwise the
/// first validation failure.
pub fn parse_config(content: &str) -> Result<AxisConfig> {
    let config: AxisConfig = toml::from_str(content).map_err(|e| {
        let message = match e.span() {
            Some(span) => bounded(format_args!(
                "line {}: {}",
                line_of(content, span.start),
                e.message()
            )),
            None => bounded(format_args!("{}", e.message())),
        };
        Error::Config(ConfigError::ParseError(message))
    })?;

    validate_config(&config)?;
    Ok(config)
}

fn line_of(content: &str, offset: usize) -> usize {
    content
        .bytes()
        .take(offset)
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Format into a fixed-capacity message, dropping what does not fit.
fn bounded(args: core::fmt::Arguments<'_>) -> Message {
    struct Clip(Message);

    impl Write for Clip {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            for c in s.chars() {
                if self.0.push(c).is_err() {
                    break;
                }
            }
            Ok(())
        }
    }

    let mut clip = Clip(Message::new());
    let _ = clip.write_fmt(args);
    clip.0
}
