//! Chroma - bus driver firmware
//!
//! Firmware for one LED bus driver board (RP2040). Decodes framed color
//! arrays arriving from the master over UART, holds an on/off frame
//! pair, refreshes the physical strip on edge-triggered Update/Disable
//! lines, and runs the self-contained demo animation while the
//! DemoEnable line stays high. Every completed bus operation is
//! acknowledged to the master with a single-byte token.

#![no_std]
#![no_main]

mod ws2812;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::{PIO0, UART0};
use embassy_rp::pio::Pio;
use embassy_rp::uart::{
    BufferedInterruptHandler, BufferedUartRx, BufferedUartTx, Config as UartConfig, Uart,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration, Timer};
use embedded_io_async::{Read, Write};
use portable_atomic::{AtomicBool, Ordering};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use chroma_core::demo::DemoSequencer;
use chroma_protocol::{ChannelOrder, ColorFrame, Decoded, EventToken, FrameDecoder};

use crate::ws2812::Ws2812;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

/// Master link baud rate
const LINK_BAUD: u32 = 1_000_000;

/// Inactivity window while a frame is in flight; firing it is the only
/// framing recovery mechanism
const FRAME_TIMEOUT: Duration = Duration::from_millis(1);

/// Strips on this board are GRB-ordered WS2812 parts
const STRIP_ORDER: ChannelOrder = ChannelOrder::Grb;

/// LED count assumed until the first frame arrives
const BOOT_LED_COUNT: u8 = 255;

/// The strip and its two retained frames
///
/// Locked as one unit: a decode commit and a refresh transmission both
/// take the mutex, so a refresh can never observe a half-written frame
/// and reception is never corrupted by a concurrent transmit.
struct BusState {
    strip: Ws2812<'static, PIO0, 0>,
    on_frame: ColorFrame,
    off_frame: ColorFrame,
}

impl BusState {
    /// Transmit the on-frame to the strip
    async fn show_on(&mut self) {
        let Self { strip, on_frame, .. } = self;
        strip.write(on_frame.pixels()).await;
    }

    /// Transmit the off-frame to the strip
    async fn show_off(&mut self) {
        let Self { strip, off_frame, .. } = self;
        strip.write(off_frame.pixels()).await;
    }
}

type SharedBus = Mutex<CriticalSectionRawMutex, BusState>;

static BUS: StaticCell<SharedBus> = StaticCell::new();

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();

/// True while the decoder is mid-frame; Update requests are dropped then
static RX_IN_FRAME: AtomicBool = AtomicBool::new(false);

/// Live demo-enable flag, mirroring the DemoEnable pin level
static DEMO_ENABLED: AtomicBool = AtomicBool::new(false);

/// Demo start requests carrying their LED count
static DEMO_START: Signal<CriticalSectionRawMutex, u8> = Signal::new();

/// Acknowledgement tokens queued for the master
static EVENT_TX: Channel<CriticalSectionRawMutex, EventToken, 4> = Channel::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Chroma driver firmware starting...");

    let p = embassy_rp::init(Default::default());

    // Master link on UART0 (GPIO0 TX, GPIO1 RX)
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = LINK_BAUD;

    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 1024]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    // Trigger lines from the master (GPIO2/3/4)
    let update = Input::new(p.PIN_2, Pull::Down);
    let disable = Input::new(p.PIN_3, Pull::Down);
    let demo = Input::new(p.PIN_4, Pull::Down);

    // Strip data out through PIO0 (GPIO16)
    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Irqs);
    let strip = Ws2812::new(&mut common, sm0, p.PIN_16);

    let bus: &'static SharedBus = BUS.init(Mutex::new(BusState {
        strip,
        on_frame: ColorFrame::blank(BOOT_LED_COUNT),
        off_frame: ColorFrame::blank(BOOT_LED_COUNT),
    }));

    // Start with the strip dark
    bus.lock().await.show_off().await;

    // Spawn tasks
    spawner.spawn(link_rx_task(rx, bus)).unwrap();
    spawner.spawn(link_tx_task(tx)).unwrap();
    spawner.spawn(update_task(update, bus)).unwrap();
    spawner.spawn(disable_task(disable, bus)).unwrap();
    spawner.spawn(demo_pin_task(demo)).unwrap();
    spawner.spawn(demo_task(bus)).unwrap();

    info!("All tasks spawned");
}

/// Link RX task - feeds received bytes through the frame decoder
///
/// While the decoder is mid-frame every read runs under the inactivity
/// window; the window expiring resets the decoder and discards the
/// partial frame. A completed array is committed wholesale under the
/// bus lock, then acknowledged.
#[embassy_executor::task]
async fn link_rx_task(mut rx: BufferedUartRx, bus: &'static SharedBus) {
    info!("Link RX task started");

    let mut decoder = FrameDecoder::new(STRIP_ORDER);
    let mut buf = [0u8; 64];

    loop {
        let n = if decoder.is_idle() {
            match rx.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    warn!("UART read error: {:?}", e);
                    continue;
                }
            }
        } else {
            match with_timeout(FRAME_TIMEOUT, rx.read(&mut buf)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    warn!("UART read error: {:?}", e);
                    continue;
                }
                Err(_) => {
                    trace!("Frame timed out, decoder reset");
                    decoder.reset();
                    RX_IN_FRAME.store(false, Ordering::Relaxed);
                    continue;
                }
            }
        };

        for &byte in &buf[..n] {
            match decoder.feed(byte) {
                Decoded::Pending => {}
                Decoded::Rejected => {
                    trace!("Framing error, decoder reset");
                }
                Decoded::Frame { count, frame } => {
                    {
                        let mut state = bus.lock().await;
                        state.on_frame = frame;
                    }
                    EVENT_TX.send(EventToken::LoadDone).await;
                    debug!("Loaded {} LEDs", count);
                }
                Decoded::DemoTrigger { count } => {
                    debug!("Demo trigger for {} LEDs", count);
                    DEMO_START.signal(count);
                }
                Decoded::OffColor { count, color } => {
                    let mut state = bus.lock().await;
                    state.off_frame = ColorFrame::filled(count, color);
                }
            }
        }

        RX_IN_FRAME.store(!decoder.is_idle(), Ordering::Relaxed);
    }
}

/// Link TX task - sends acknowledgement tokens back to the master
#[embassy_executor::task]
async fn link_tx_task(mut tx: BufferedUartTx) {
    info!("Link TX task started");

    loop {
        let token = EVENT_TX.receive().await;
        if let Err(e) = tx.write_all(&[token.to_byte()]).await {
            warn!("UART write error: {:?}", e);
        }
    }
}

/// Update task - refreshes the strip from the on-frame
///
/// A rising edge that arrives while a frame is being received is
/// dropped, not queued: frame integrity wins over responsiveness, and
/// the next edge will succeed once the decoder is idle again.
#[embassy_executor::task]
async fn update_task(mut pin: Input<'static>, bus: &'static SharedBus) {
    info!("Update task started");

    loop {
        pin.wait_for_rising_edge().await;

        if RX_IN_FRAME.load(Ordering::Relaxed) {
            trace!("Update dropped: frame in flight");
            continue;
        }

        bus.lock().await.show_on().await;
        EVENT_TX.send(EventToken::LedsUpdated).await;
    }
}

/// Disable task - blanks the strip from the off-frame
///
/// Unlike Update this is never starved: it fires regardless of decoder
/// state.
#[embassy_executor::task]
async fn disable_task(mut pin: Input<'static>, bus: &'static SharedBus) {
    info!("Disable task started");

    loop {
        pin.wait_for_rising_edge().await;

        bus.lock().await.show_off().await;
        EVENT_TX.send(EventToken::LedsOff).await;
    }
}

/// DemoEnable pin task - mirrors the pin level into the live demo flag
#[embassy_executor::task]
async fn demo_pin_task(mut pin: Input<'static>) {
    info!("Demo pin task started");

    DEMO_ENABLED.store(pin.is_high(), Ordering::Relaxed);

    loop {
        pin.wait_for_any_edge().await;
        DEMO_ENABLED.store(pin.is_high(), Ordering::Relaxed);
    }
}

/// Demo task - runs the animation while the enable flag stays set
///
/// The flag is checked before every render and before every delay, so
/// cancellation lands between steps and the strip is blanked within one
/// step of the flag clearing.
#[embassy_executor::task]
async fn demo_task(bus: &'static SharedBus) {
    info!("Demo task started");

    loop {
        let count = DEMO_START.wait().await;
        info!("Demo started over {} LEDs", count);

        let mut sequencer = DemoSequencer::new(count);
        while DEMO_ENABLED.load(Ordering::Relaxed) {
            let step = sequencer.next_step();
            {
                let mut state = bus.lock().await;
                state.strip.write(step.frame.pixels()).await;
            }

            if !DEMO_ENABLED.load(Ordering::Relaxed) {
                break;
            }
            Timer::after_millis(u64::from(step.delay_ms)).await;
        }

        bus.lock().await.show_off().await;
        info!("Demo stopped");
    }
}
