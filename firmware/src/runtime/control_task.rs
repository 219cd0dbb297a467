use portable_atomic::Ordering;

use super::{ControlDevice, ControlScheduler, PENDING_TICKS, TICK_SIGNAL};

/// Hosts the cooperative scheduler: drains the ticks the SysTick exception
/// banked, then runs one dispatch pass.
///
/// The exception owns time; this task owns every piece of device state, so
/// no task logic ever executes in interrupt context and no two scheduled
/// tasks ever overlap.
#[embassy_executor::task]
pub async fn run(mut device: ControlDevice, mut scheduler: ControlScheduler) -> ! {
    loop {
        TICK_SIGNAL.wait().await;
        let pending = PENDING_TICKS.swap(0, Ordering::Relaxed);
        for _ in 0..pending {
            scheduler.tick();
        }
        scheduler.dispatch(&mut device);
    }
}
