//! Assembles the interrupt handlers of a tilt axis.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::{validate_config, AxisConfig};
use crate::driver::{SpiPort, StepDirInterface, Tmc260};
use crate::error::{ConfigError, Error, Result};
use crate::motion::SweepProfile;

use super::controller::TiltController;
use super::home::HomeSensor;
use super::phase::PhaseTag;
use super::ports::{DebugIndicators, PeriodicTimer, TelemetrySink};
use super::shared::AxisShared;
use super::stall::StallMonitor;
use super::step_generator::StepGenerator;

/// The handlers of one axis, ready to be moved into their interrupts.
pub struct TiltAxis<'a, STEP, DIR, EN, HOME, P, CS, D, ST, MT, S, I> {
    /// Step-timer handler
    pub step_generator: StepGenerator<'a, STEP, DIR, EN, ST, I>,
    /// Home sensor edge handler
    pub home_sensor: HomeSensor<'a, HOME, I>,
    /// stallGuard2 edge handler
    pub stall_monitor: StallMonitor<'a, I>,
    /// State-machine timer handler
    pub controller: TiltController<'a, P, CS, D, MT, S, I>,
}

/// Builder for [`TiltAxis`].
///
/// The sweep table is large, so it is generated straight into a
/// caller-provided slot that outlives the handlers. An empty slot is filled
/// from the configured trapezoid; a slot that already holds entries is used
/// as is.
///
/// ```rust,ignore
/// static SHARED: AxisShared = AxisShared::new();
///
/// // `profile` is a `&'static mut SweepProfile` taken from a static cell
/// let axis = TiltAxisBuilder::new()
///     .config(config)
///     .pins(step, dir, enable)
///     .home_pin(home)
///     .driver(Tmc260::new(BusPort::new(spi), cs, delay, config.transport))
///     .step_timer(tim2)
///     .state_timer(tim3)
///     .telemetry(())
///     .indicators(NoIndicators)
///     .profile_slot(profile)
///     .build(&SHARED)?;
/// ```
pub struct TiltAxisBuilder<'a, STEP, DIR, EN, HOME, P, CS, D, ST, MT, S, I> {
    pins: Option<(STEP, DIR, EN)>,
    home_pin: Option<HOME>,
    driver: Option<Tmc260<P, CS, D>>,
    step_timer: Option<ST>,
    state_timer: Option<MT>,
    telemetry: Option<S>,
    indicators: Option<I>,
    profile: Option<&'a mut SweepProfile>,
    config: AxisConfig,
}

impl<STEP, DIR, EN, HOME, P, CS, D, ST, MT, S, I> Default
    for TiltAxisBuilder<'_, STEP, DIR, EN, HOME, P, CS, D, ST, MT, S, I>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, STEP, DIR, EN, HOME, P, CS, D, ST, MT, S, I>
    TiltAxisBuilder<'a, STEP, DIR, EN, HOME, P, CS, D, ST, MT, S, I>
{
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            pins: None,
            home_pin: None,
            driver: None,
            step_timer: None,
            state_timer: None,
            telemetry: None,
            indicators: None,
            profile: None,
            config: AxisConfig::default(),
        }
    }

    /// Set the axis configuration.
    pub fn config(mut self, config: AxisConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the STEP, DIR and EN lines.
    pub fn pins(mut self, step: STEP, dir: DIR, enable: EN) -> Self {
        self.pins = Some((step, dir, enable));
        self
    }

    /// Set the home sensor input.
    pub fn home_pin(mut self, pin: HOME) -> Self {
        self.home_pin = Some(pin);
        self
    }

    /// Set the TMC260 driver.
    pub fn driver(mut self, driver: Tmc260<P, CS, D>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Set the timer clocking step pulses.
    pub fn step_timer(mut self, timer: ST) -> Self {
        self.step_timer = Some(timer);
        self
    }

    /// Set the timer clocking the state machine.
    pub fn state_timer(mut self, timer: MT) -> Self {
        self.state_timer = Some(timer);
        self
    }

    /// Set the telemetry output.
    pub fn telemetry(mut self, sink: S) -> Self {
        self.telemetry = Some(sink);
        self
    }

    /// Set the debug indicators.
    pub fn indicators(mut self, indicators: I) -> Self {
        self.indicators = Some(indicators);
        self
    }

    /// Set the storage holding the sweep table.
    pub fn profile_slot(mut self, slot: &'a mut SweepProfile) -> Self {
        self.profile = Some(slot);
        self
    }
}

impl<'a, STEP, DIR, EN, HOME, P, CS, D, ST, MT, S, I>
    TiltAxisBuilder<'a, STEP, DIR, EN, HOME, P, CS, D, ST, MT, S, I>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    HOME: InputPin,
    P: SpiPort,
    CS: OutputPin,
    D: DelayNs,
    ST: PeriodicTimer,
    MT: PeriodicTimer,
    S: TelemetrySink,
    I: DebugIndicators + Clone,
{
    /// Validate, start both timers and sample the home flag.
    ///
    /// The controller starts in `Initialize`; the driver is programmed on its
    /// first tick.
    ///
    /// # Errors
    ///
    /// Configuration errors, `MissingHardware` for any part not supplied, and
    /// `PinError` if the home sensor cannot be read.
    pub fn build(
        self,
        shared: &'a AxisShared,
    ) -> Result<TiltAxis<'a, STEP, DIR, EN, HOME, P, CS, D, ST, MT, S, I>> {
        let config = self.config;
        validate_config(&config)?;

        let (step, dir, enable) = self.pins.ok_or(ConfigError::MissingHardware("step/dir pins"))?;
        let home_pin = self.home_pin.ok_or(ConfigError::MissingHardware("home pin"))?;
        let driver = self.driver.ok_or(ConfigError::MissingHardware("driver"))?;
        let mut step_timer = self.step_timer.ok_or(ConfigError::MissingHardware("step timer"))?;
        let mut state_timer =
            self.state_timer.ok_or(ConfigError::MissingHardware("state timer"))?;
        let telemetry = self.telemetry.ok_or(ConfigError::MissingHardware("telemetry"))?;
        let indicators = self.indicators.ok_or(ConfigError::MissingHardware("indicators"))?;

        let profile = self.profile.ok_or(ConfigError::MissingHardware("profile slot"))?;
        if profile.is_empty() {
            profile.fill_from_config(&config)?;
        }
        let profile: &'a SweepProfile = profile;

        let default_reload = config
            .default_step_reload()
            .ok_or(ConfigError::InvalidFrequency(config.timing.default_step_hz.0))?;
        let home_reload = config
            .home_step_reload()
            .ok_or(ConfigError::InvalidFrequency(config.timing.home_step_hz.0))?;
        let state_reload = config
            .state_reload()
            .ok_or(ConfigError::InvalidFrequency(config.timing.state_machine_hz.0))?;

        shared.publish_phase(PhaseTag::Initialize);

        let mut home_sensor = HomeSensor::new(
            shared,
            home_pin,
            config.home.covered_level,
            config.mechanics,
            indicators.clone(),
        );
        let flag = home_sensor.sample().map_err(Error::Motion)?;
        let stall_monitor = StallMonitor::new(shared, indicators.clone());

        step_timer.set_reload(default_reload);
        step_timer.start();
        state_timer.set_reload(state_reload);
        state_timer.start();

        info!(
            "tilt axis up: step reload {}, state reload {}, flag {}",
            default_reload,
            state_reload,
            flag
        );

        Ok(TiltAxis {
            step_generator: StepGenerator::new(
                shared,
                StepDirInterface::new(step, dir, enable),
                step_timer,
                profile,
                config.mechanics,
                indicators.clone(),
            ),
            home_sensor,
            stall_monitor,
            controller: TiltController::new(
                shared,
                driver,
                state_timer,
                telemetry,
                indicators,
                config,
                default_reload,
                home_reload,
            ),
        })
    }
}
