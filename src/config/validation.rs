//! Configuration validation.

use crate::driver::RegisterValue;
use crate::error::{ConfigError, Error, Result};
use crate::motion::{TrapezoidPlan, MAX_PROFILE_LEN};

use super::system::{DriverSettings, SequenceConfig, SweepConfig, TimingConfig, TransportConfig};
use super::{AxisConfig, TiltMechanics};

/// Validate an axis configuration.
///
/// Checks:
/// - Gear ratio terms are positive
/// - Every configured rate yields a usable timer reload
/// - The tilt window straddles home
/// - Tick counts are non-zero
/// - Bring-up register values fit their fields
/// - The sweep fits the profile table
pub fn validate_config(config: &AxisConfig) -> Result<()> {
    validate_mechanics(&config.mechanics)?;
    validate_timing(&config.timing)?;

    if !config.limits.is_valid() {
        return Err(Error::Config(ConfigError::InvalidBounds {
            min: config.limits.min_rad.0,
            max: config.limits.max_rad.0,
        }));
    }

    validate_sequence(&config.sequence)?;
    validate_transport(&config.transport)?;
    validate_driver(&config.driver, config)?;
    validate_sweep(&config.sweep, config)?;

    Ok(())
}

fn validate_mechanics(mechanics: &TiltMechanics) -> Result<()> {
    let usable = |term: f32| term.is_finite() && term > 0.0;
    if !usable(mechanics.gear_ratio_num) || !usable(mechanics.gear_ratio_den) {
        return Err(Error::Config(ConfigError::InvalidGearRatio {
            num: mechanics.gear_ratio_num,
            den: mechanics.gear_ratio_den,
        }));
    }

    if mechanics.full_steps_per_revolution == 0 {
        return Err(Error::Config(ConfigError::InvalidTickCount(
            "full_steps_per_revolution",
        )));
    }

    Ok(())
}

fn validate_timing(timing: &TimingConfig) -> Result<()> {
    let checks = [
        (timing.state_timer, timing.state_machine_hz),
        (timing.step_timer, timing.default_step_hz),
        (timing.step_timer, timing.home_step_hz),
    ];

    for (clock, rate) in checks {
        if clock.reload(rate).is_none() {
            return Err(Error::Config(ConfigError::InvalidFrequency(rate.0)));
        }
    }

    Ok(())
}

fn validate_sequence(sequence: &SequenceConfig) -> Result<()> {
    let counts = [
        ("settle_ticks", sequence.settle_ticks),
        ("test_phase_ticks", sequence.test_phase_ticks),
        ("report_interval_ticks", sequence.report_interval_ticks),
        ("home_timeout_ticks", sequence.home_timeout_ticks),
        ("sweep_timeout_ticks", sequence.sweep_timeout_ticks),
    ];

    for (name, value) in counts {
        if value == 0 {
            return Err(Error::Config(ConfigError::InvalidTickCount(name)));
        }
    }

    Ok(())
}

fn validate_transport(transport: &TransportConfig) -> Result<()> {
    if transport.poll_limit == 0 {
        return Err(Error::Config(ConfigError::InvalidTickCount("poll_limit")));
    }
    Ok(())
}

fn validate_driver(driver: &DriverSettings, config: &AxisConfig) -> Result<()> {
    if !driver.double_edge {
        return Err(Error::Config(ConfigError::SingleEdgeStepping));
    }

    // Every field must fit before anything reaches the bus
    driver.drvconf.pack()?;
    driver.drvctrl(config.mechanics.microsteps).pack()?;
    driver.chopconf.pack()?;
    driver.smarten.pack()?;
    driver.sgcsconf.pack()?;

    Ok(())
}

fn validate_sweep(sweep: &SweepConfig, config: &AxisConfig) -> Result<()> {
    let clock = config.timing.step_timer;

    for rate in [sweep.start_hz, sweep.cruise_hz] {
        if clock.reload(rate).is_none() {
            return Err(Error::Config(ConfigError::InvalidFrequency(rate.0)));
        }
    }

    if !(sweep.acceleration > 0.0) {
        return Err(Error::Config(ConfigError::EmptyProfile));
    }

    let plan = TrapezoidPlan::from_sweep(sweep, &config.mechanics);
    if plan.total_steps == 0 {
        return Err(Error::Config(ConfigError::EmptyProfile));
    }
    if plan.total_steps as usize >= MAX_PROFILE_LEN {
        return Err(Error::Config(ConfigError::ProfileTooLong(plan.total_steps)));
    }

    Ok(())
}
