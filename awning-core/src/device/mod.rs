//! Device assembly: the shared context every scheduled task runs against,
//! and the control task set itself.
//!
//! All mutable device state lives in one owned struct threaded through the
//! scheduler, so the mutation sites are exactly the command executor and the
//! sensor/state tasks.

use crate::command::{self, RegisterFile};
use crate::config::{ConfigStore, Thresholds};
use crate::protocol::{self, HostLink};
use crate::scheduler::{Scheduler, SchedulerError, Ticks};
use crate::sensor::{DeviceIdentity, RangeFinder, TriggerSensor};
use crate::state::{DeviceState, Direction, IndicatorDriver, StateMachine};

/// Scheduler tick period the task cadences below are written against.
pub const TICK_PERIOD_MS: u32 = 10;

/// Task table capacity: the four startup registrations plus headroom for the
/// ranging flow's one-shot latch.
pub const TASK_CAPACITY: usize = 8;

/// Ticks between ultrasonic trigger pulses.
pub const RANGING_PERIOD_TICKS: Ticks = 40;
/// One-shot delay between a trigger pulse and latching the echo result.
pub const RANGE_LATCH_DELAY_TICKS: Ticks = 40;
/// Ticks between trigger-sensor samples.
pub const TRIGGER_SAMPLE_PERIOD_TICKS: Ticks = 10;

/// Most recent sensor readings, written by the sensor tasks and read by the
/// state task and the command executor.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Readings {
    pub trigger: f32,
    pub distance: f32,
}

/// Scheduler sized for the control task set.
pub type ControlScheduler<S, R, P, I, L> = Scheduler<Device<S, R, P, I, L>, TASK_CAPACITY>;

/// Shared context owned by the control loop and threaded through every task.
pub struct Device<S, R, P, I, L> {
    trigger_sensor: S,
    range_finder: R,
    store: P,
    indicators: I,
    link: L,
    readings: Readings,
    thresholds: Thresholds,
    machine: StateMachine,
}

impl<S, R, P, I, L> Device<S, R, P, I, L>
where
    S: TriggerSensor,
    R: RangeFinder,
    P: ConfigStore,
    I: IndicatorDriver,
    L: HostLink,
{
    pub fn new(trigger_sensor: S, range_finder: R, store: P, indicators: I, link: L) -> Self {
        Self {
            trigger_sensor,
            range_finder,
            store,
            indicators,
            link,
            readings: Readings::default(),
            thresholds: Thresholds::new(),
            machine: StateMachine::new(),
        }
    }

    /// Loads the persisted thresholds into the in-memory mirror. Runs once at
    /// startup, before the scheduler starts.
    pub fn load_thresholds(&mut self) {
        self.thresholds = Thresholds::load_from(&mut self.store);
    }

    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.machine.state()
    }

    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        self.machine.direction()
    }

    #[must_use]
    pub const fn readings(&self) -> Readings {
        self.readings
    }

    #[must_use]
    pub const fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn thresholds_mut(&mut self) -> &mut Thresholds {
        &mut self.thresholds
    }

    #[must_use]
    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::for_kind(self.trigger_sensor.kind())
    }

    // Component accessors for host tooling and the test suites.

    pub fn trigger_sensor_mut(&mut self) -> &mut S {
        &mut self.trigger_sensor
    }

    pub fn range_finder_mut(&mut self) -> &mut R {
        &mut self.range_finder
    }

    #[must_use]
    pub const fn indicators(&self) -> &I {
        &self.indicators
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn store_mut(&mut self) -> &mut P {
        &mut self.store
    }

    fn poll_host(&mut self) {
        let Some(frame) = protocol::receive(&mut self.link) else {
            return;
        };
        // A frame that picked up a decode error is dropped here; nothing is
        // transmitted for it.
        if !frame.is_valid() {
            return;
        }
        let identity = DeviceIdentity::for_kind(self.trigger_sensor.kind());
        let mut registers = RegisterFile {
            readings: &self.readings,
            state: self.machine.state(),
            identity,
            thresholds: &mut self.thresholds,
            store: &mut self.store,
        };
        let reply = command::execute(frame, &mut registers);
        if !reply.is_suppressed() {
            self.link.send(reply.bytes());
        }
    }

    fn update_state(&mut self) {
        self.machine.evaluate(
            &self.thresholds,
            self.readings.trigger,
            self.readings.distance,
            &mut self.indicators,
        );
    }

    fn sample_trigger(&mut self) {
        self.readings.trigger = self.trigger_sensor.read();
    }

    fn start_ranging(&mut self) {
        self.range_finder.trigger();
    }

    fn latch_distance(&mut self) {
        self.readings.distance = self.range_finder.read_distance();
    }
}

/// Protocol task: decode one frame from the host and act on it.
pub fn poll_host_task<S, R, P, I, L>(
    device: &mut Device<S, R, P, I, L>,
    _scheduler: &mut ControlScheduler<S, R, P, I, L>,
) where
    S: TriggerSensor,
    R: RangeFinder,
    P: ConfigStore,
    I: IndicatorDriver,
    L: HostLink,
{
    device.poll_host();
}

/// State task: one state-machine evaluation against the latest readings.
pub fn update_state_task<S, R, P, I, L>(
    device: &mut Device<S, R, P, I, L>,
    _scheduler: &mut ControlScheduler<S, R, P, I, L>,
) where
    S: TriggerSensor,
    R: RangeFinder,
    P: ConfigStore,
    I: IndicatorDriver,
    L: HostLink,
{
    device.update_state();
}

/// Ranging task: emit the ultrasonic trigger pulse and arm the one-shot that
/// latches the echo result once it has settled.
pub fn start_ranging_task<S, R, P, I, L>(
    device: &mut Device<S, R, P, I, L>,
    scheduler: &mut ControlScheduler<S, R, P, I, L>,
) where
    S: TriggerSensor,
    R: RangeFinder,
    P: ConfigStore,
    I: IndicatorDriver,
    L: HostLink,
{
    device.start_ranging();
    // The table reserves headroom for this slot; should it ever be taken the
    // distance reading stays stale until the next ranging cycle.
    let _ = scheduler.add_task(latch_distance_task, RANGE_LATCH_DELAY_TICKS, 0);
}

/// One-shot follow-up to [`start_ranging_task`].
pub fn latch_distance_task<S, R, P, I, L>(
    device: &mut Device<S, R, P, I, L>,
    _scheduler: &mut ControlScheduler<S, R, P, I, L>,
) where
    S: TriggerSensor,
    R: RangeFinder,
    P: ConfigStore,
    I: IndicatorDriver,
    L: HostLink,
{
    device.latch_distance();
}

/// Sensor task: refresh the trigger-sensor reading.
pub fn sample_trigger_task<S, R, P, I, L>(
    device: &mut Device<S, R, P, I, L>,
    _scheduler: &mut ControlScheduler<S, R, P, I, L>,
) where
    S: TriggerSensor,
    R: RangeFinder,
    P: ConfigStore,
    I: IndicatorDriver,
    L: HostLink,
{
    device.sample_trigger();
}

/// Registers the control task set with its production cadences: host polling
/// and state evaluation every tick, trigger sampling every
/// [`TRIGGER_SAMPLE_PERIOD_TICKS`], ranging every [`RANGING_PERIOD_TICKS`].
///
/// # Errors
///
/// Propagates [`SchedulerError`] if the table cannot hold the task set.
pub fn register_control_tasks<S, R, P, I, L>(
    scheduler: &mut ControlScheduler<S, R, P, I, L>,
) -> Result<(), SchedulerError>
where
    S: TriggerSensor,
    R: RangeFinder,
    P: ConfigStore,
    I: IndicatorDriver,
    L: HostLink,
{
    scheduler.add_task(poll_host_task, 0, 1)?;
    scheduler.add_task(update_state_task, 0, 1)?;
    scheduler.add_task(start_ranging_task, 0, RANGING_PERIOD_TICKS)?;
    scheduler.add_task(sample_trigger_task, 0, TRIGGER_SAMPLE_PERIOD_TICKS)?;
    Ok(())
}
