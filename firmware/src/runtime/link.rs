use embassy_stm32::Peri;
use embassy_stm32::mode::Blocking;
use embassy_stm32::peripherals::{PA2, PA3, USART2};
use embassy_stm32::usart::{Config, Uart, UartRx, UartTx};

use awning_core::protocol::HostLink;

/// Dashboard link baud rate, fixed by the wire contract.
const BAUD: u32 = 19_200;

/// Blocking USART wrapper implementing the byte-level host link.
pub struct UartLink {
    tx: UartTx<'static, Blocking>,
    rx: UartRx<'static, Blocking>,
}

impl UartLink {
    pub fn new(usart: Peri<'static, USART2>, rx: Peri<'static, PA3>, tx: Peri<'static, PA2>) -> Self {
        let mut config = Config::default();
        config.baudrate = BAUD;
        let uart = Uart::new_blocking(usart, rx, tx, config).expect("USART2 configuration");
        let (tx, rx) = uart.split();
        Self { tx, rx }
    }
}

impl HostLink for UartLink {
    fn poll_byte(&mut self) -> Option<u8> {
        self.rx.nb_read().ok()
    }

    fn send(&mut self, bytes: &[u8]) {
        if self.tx.blocking_write(bytes).is_err() {
            defmt::warn!("link: UART write error");
        }
    }
}
