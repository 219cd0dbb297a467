use embassy_stm32::Peri;
use embassy_stm32::adc::Adc;
use embassy_stm32::gpio::Output;
use embassy_stm32::peripherals::{ADC1, PA4};
use embassy_time::{Duration, block_for};

use awning_core::sensor::{RangeFinder, SensorKind, TriggerSensor};

use crate::convert;
use crate::echo::EchoCell;

/// Width of the ultrasonic trigger pulse.
const TRIGGER_PULSE: Duration = Duration::from_micros(12);

#[cfg(not(any(feature = "light-sensor", feature = "temp-sensor")))]
compile_error!("select a trigger sensor: enable `light-sensor` or `temp-sensor`");

/// Light-dependent divider on the ADC, reported on the dashboard's 0-1023
/// scale.
pub struct LightSensor {
    adc: Adc<'static, ADC1>,
    pin: Peri<'static, PA4>,
}

impl TriggerSensor for LightSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Light
    }

    fn read(&mut self) -> f32 {
        convert::light_level(self.adc.blocking_read(&mut self.pin))
    }
}

/// TMP36 on the ADC, reporting degrees Celsius.
pub struct TemperatureSensor {
    adc: Adc<'static, ADC1>,
    pin: Peri<'static, PA4>,
}

impl TriggerSensor for TemperatureSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Temperature
    }

    fn read(&mut self) -> f32 {
        let celsius = convert::degrees_celsius(self.adc.blocking_read(&mut self.pin));
        defmt::debug!(
            "sensors: {=f32} °C ({=f32} °F)",
            celsius,
            convert::degrees_fahrenheit(celsius)
        );
        celsius
    }
}

#[cfg(feature = "light-sensor")]
pub type ActiveTriggerSensor = LightSensor;
#[cfg(all(feature = "temp-sensor", not(feature = "light-sensor")))]
pub type ActiveTriggerSensor = TemperatureSensor;

/// Builds the trigger sensor selected by the build features.
pub fn active_trigger_sensor(
    adc: Peri<'static, ADC1>,
    pin: Peri<'static, PA4>,
) -> ActiveTriggerSensor {
    ActiveTriggerSensor {
        adc: Adc::new(adc),
        pin,
    }
}

/// HC-SR04 front end: owns the trigger pin, reads echoes from the shared
/// cell the capture task publishes into.
pub struct UltrasonicRanger {
    trigger: Output<'static>,
    echo: &'static EchoCell,
}

impl UltrasonicRanger {
    pub fn new(trigger: Output<'static>, echo: &'static EchoCell) -> Self {
        Self { trigger, echo }
    }
}

impl RangeFinder for UltrasonicRanger {
    fn trigger(&mut self) {
        self.trigger.set_high();
        block_for(TRIGGER_PULSE);
        self.trigger.set_low();
    }

    fn read_distance(&mut self) -> f32 {
        convert::pulse_to_centimetres(self.echo.snapshot().pulse_us)
    }
}
