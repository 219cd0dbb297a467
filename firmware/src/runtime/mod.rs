//! Hardware runtime: interrupt wiring, peripheral setup, and the embassy
//! tasks that host the cooperative control loop.

use cortex_m::interrupt;
use cortex_m::peripheral::SYST;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::register::primask;
use cortex_m_rt::exception;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicU32, Ordering};

use awning_core::device::{self, Device};

use crate::echo::EchoCell;

mod control_task;
mod echo_task;
mod indicators;
mod link;
mod sensors;
mod store;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Sysclk with the default RCC configuration (HSI16).
const SYSCLK_HZ: u32 = 16_000_000;

/// Ticks accumulated by the SysTick exception and not yet drained by the
/// control task. Counting instead of flagging means a long dispatch pass
/// delays ticks but never loses them.
static PENDING_TICKS: AtomicU32 = AtomicU32::new(0);

/// Wakes the control task after each tick.
static TICK_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Shared echo measurement cell: the capture task produces, the control
/// loop's range finder consumes.
static ECHO: EchoCell = EchoCell::new();

#[cfg(feature = "bench-defaults")]
const BENCH_THRESHOLDS: awning_core::config::Thresholds = awning_core::config::Thresholds {
    trigger_min: 400.0,
    trigger_max: 600.0,
    distance_min: 10.0,
    distance_max: 30.0,
};

pub(crate) type ControlDevice = Device<
    sensors::ActiveTriggerSensor,
    sensors::UltrasonicRanger,
    store::FlashStore,
    indicators::LedPanel,
    link::UartLink,
>;

pub(crate) type ControlScheduler = device::ControlScheduler<
    sensors::ActiveTriggerSensor,
    sensors::UltrasonicRanger,
    store::FlashStore,
    indicators::LedPanel,
    link::UartLink,
>;

/// The tick source. Only scheduler bookkeeping happens here; task logic
/// stays in the control task's context.
#[exception]
fn SysTick() {
    PENDING_TICKS.fetch_add(1, Ordering::Relaxed);
    TICK_SIGNAL.signal(());
}

/// Arms the periodic tick at [`device::TICK_PERIOD_MS`].
fn start_tick(mut syst: SYST) {
    let reload = SYSCLK_HZ / 1_000 * device::TICK_PERIOD_MS - 1;
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(reload);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let p = hal::init(hal::Config::default());

    let panel = indicators::LedPanel::new(
        Output::new(p.PB3, Level::Low, Speed::Low),
        Output::new(p.PB4, Level::Low, Speed::Low),
        Output::new(p.PB5, Level::Low, Speed::Low),
    );
    let uart = link::UartLink::new(p.USART2, p.PA3, p.PA2);
    let flash = store::FlashStore::new(hal::flash::Flash::new_blocking(p.FLASH));
    let ranger =
        sensors::UltrasonicRanger::new(Output::new(p.PA0, Level::Low, Speed::Low), &ECHO);
    let trigger_sensor = sensors::active_trigger_sensor(p.ADC1, p.PA4);

    let mut device = Device::new(trigger_sensor, ranger, flash, panel, uart);
    device.load_thresholds();

    #[cfg(feature = "bench-defaults")]
    if !device.thresholds().is_calibrated() {
        *device.thresholds_mut() = BENCH_THRESHOLDS;
        defmt::info!("runtime: storage uncalibrated, seeded bench thresholds");
    }

    let mut scheduler = ControlScheduler::new();
    device::register_control_tasks(&mut scheduler).expect("control task registration");
    scheduler.start();

    spawner
        .spawn(echo_task::run(ExtiInput::new(p.PA1, p.EXTI1, Pull::Down)))
        .expect("failed to spawn echo capture task");
    spawner
        .spawn(control_task::run(device, scheduler))
        .expect("failed to spawn control task");

    let core_peripherals = cortex_m::Peripherals::take().expect("core peripherals already taken");
    start_tick(core_peripherals.SYST);
    defmt::info!("runtime: scheduler armed, tick {} ms", device::TICK_PERIOD_MS);

    core::future::pending::<()>().await;
}
