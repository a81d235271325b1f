//! Chroma - RGB array master firmware
//!
//! Main firmware binary for RP2040-based master boards. Holds the
//! host-visible register bank and fans color arrays out to two driver
//! boards over dedicated UART links, coordinating their refresh through
//! per-bus trigger lines and acknowledgement tokens.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use chroma_core::bridge::BusId;

mod channels;
mod tasks;

use crate::tasks::MasterPins;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

/// Bus link baud rate
const BUS_BAUD: u32 = 1_000_000;

// Static cells for UART buffers (must live forever)
static TX_BUF0: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF0: StaticCell<[u8; 256]> = StaticCell::new();
static TX_BUF1: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF1: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Chroma master firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Bus links run at 1 Mbaud
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = BUS_BAUD;

    // Bus 0 link on UART0 (GPIO0 TX, GPIO1 RX)
    let tx_buf0 = TX_BUF0.init([0u8; 256]);
    let rx_buf0 = RX_BUF0.init([0u8; 256]);
    let uart0 = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart0 = uart0.into_buffered(Irqs, tx_buf0, rx_buf0);
    let (tx0, rx0) = uart0.split();

    // Bus 1 link on UART1 (GPIO4 TX, GPIO5 RX)
    let tx_buf1 = TX_BUF1.init([0u8; 256]);
    let rx_buf1 = RX_BUF1.init([0u8; 256]);
    let uart1 = Uart::new_blocking(p.UART1, p.PIN_4, p.PIN_5, uart_config);
    let uart1 = uart1.into_buffered(Irqs, tx_buf1, rx_buf1);
    let (tx1, rx1) = uart1.split();

    info!("Bus links initialized");

    // Per-bus trigger lines and host-visible outputs
    // Pin assignments are board-specific
    let pins = MasterPins {
        update: [
            Output::new(p.PIN_6, Level::Low),
            Output::new(p.PIN_10, Level::Low),
        ],
        disable: [
            Output::new(p.PIN_7, Level::Low),
            Output::new(p.PIN_11, Level::Low),
        ],
        demo: [
            Output::new(p.PIN_8, Level::Low),
            Output::new(p.PIN_12, Level::Low),
        ],
        dout: [
            Output::new(p.PIN_16, Level::Low),
            Output::new(p.PIN_17, Level::Low),
            Output::new(p.PIN_18, Level::Low),
            Output::new(p.PIN_19, Level::Low),
            Output::new(p.PIN_20, Level::Low),
        ],
    };

    // Digital input DI0
    let di0 = Input::new(p.PIN_22, Pull::Down);

    // Spawn tasks
    spawner.spawn(tasks::tick_task()).unwrap();
    spawner.spawn(tasks::pins_task(pins)).unwrap();
    spawner.spawn(tasks::di0_task(di0)).unwrap();
    spawner.spawn(tasks::bus_rx_task(BusId::Bus0, rx0)).unwrap();
    spawner.spawn(tasks::bus_rx_task(BusId::Bus1, rx1)).unwrap();
    spawner.spawn(tasks::bus_tx_task(BusId::Bus0, tx0)).unwrap();
    spawner.spawn(tasks::bus_tx_task(BusId::Bus1, tx1)).unwrap();
    spawner.spawn(tasks::controller_task()).unwrap();

    info!("All tasks spawned, firmware running");

    // The host register core drains HOST_REPLY/HOST_EVENT and feeds
    // HOST_REQUEST; nothing else to do here
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
