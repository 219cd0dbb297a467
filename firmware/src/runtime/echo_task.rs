use embassy_futures::select::{Either, select};
use embassy_stm32::exti::ExtiInput;
use embassy_time::{Duration, Instant, Timer};

use super::ECHO;

/// Longest plausible echo: ~4 m round trip plus margin. Anything slower is
/// recorded as an overrun.
const ECHO_TIMEOUT: Duration = Duration::from_millis(30);

/// Measures echo pulse widths on the EXTI line and publishes them into the
/// shared cell. Runs independently of the cooperative scheduler; the control
/// loop only ever sees the latest completed measurement.
///
/// TODO: move the timing onto a TIM input-capture channel if wakeup jitter
/// ever shows up in the distance readings.
#[embassy_executor::task]
pub async fn run(mut echo: ExtiInput<'static>) -> ! {
    loop {
        echo.wait_for_rising_edge().await;
        let rise = Instant::now();
        match select(echo.wait_for_falling_edge(), Timer::after(ECHO_TIMEOUT)).await {
            Either::First(()) => {
                ECHO.publish_pulse(rise.elapsed().as_micros() as u32);
            }
            Either::Second(()) => {
                ECHO.note_overrun();
                defmt::warn!("echo: pulse timed out");
            }
        }
    }
}
