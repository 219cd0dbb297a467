//! Sensor unit conversions, kept pure so they test on the host.

#![allow(dead_code)]

/// ADC full scale for the G0's 12-bit sampler.
const ADC_FULL_SCALE: f32 = 4096.0;
/// Analog supply rail feeding the sensors.
const VDDA_VOLTS: f32 = 3.3;
/// TMP36 offset: 0.5 V at 0 °C.
const TMP36_OFFSET_VOLTS: f32 = 0.5;
/// TMP36 slope: 10 mV per degree.
const TMP36_VOLTS_PER_DEGREE: f32 = 0.01;

/// Scales a raw 12-bit light sample down to the dashboard's historical
/// 0-1023 range, so stored thresholds keep their meaning.
pub fn light_level(raw: u16) -> f32 {
    f32::from(raw >> 2)
}

/// Converts a raw TMP36 sample to degrees Celsius.
pub fn degrees_celsius(raw: u16) -> f32 {
    let volts = f32::from(raw) * VDDA_VOLTS / ADC_FULL_SCALE;
    (volts - TMP36_OFFSET_VOLTS) / TMP36_VOLTS_PER_DEGREE
}

/// Converts Celsius to Fahrenheit for diagnostic output.
pub fn degrees_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Converts an echo pulse width to centimetres (round trip at ~343 m/s).
pub fn pulse_to_centimetres(pulse_us: u32) -> f32 {
    pulse_us as f32 / 58.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.1
    }

    #[test]
    fn light_tops_out_at_dashboard_scale() {
        assert_eq!(light_level(0), 0.0);
        assert_eq!(light_level(4095), 1023.0);
    }

    #[test]
    fn tmp36_zero_point_is_half_a_volt() {
        // 0.5 V on a 3.3 V / 12-bit scale.
        let raw = (0.5 / 3.3 * 4096.0) as u16;
        assert!(close(degrees_celsius(raw), 0.0));
    }

    #[test]
    fn fahrenheit_matches_known_points() {
        assert!(close(degrees_fahrenheit(0.0), 32.0));
        assert!(close(degrees_fahrenheit(100.0), 212.0));
    }

    #[test]
    fn ten_centimetres_is_580_microseconds() {
        assert!(close(pulse_to_centimetres(580), 10.0));
    }
}
