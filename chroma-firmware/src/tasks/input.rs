//! DI0 edge task
//!
//! Forwards level changes on the digital input to the controller, which
//! owns the register mirror and the configured edge behavior.

use defmt::*;
use embassy_rp::gpio::Input;

use crate::channels::DI0_EVENT;

/// DI0 task - reports every level change (and the boot level) to the controller
#[embassy_executor::task]
pub async fn di0_task(mut pin: Input<'static>) {
    info!("DI0 task started");

    DI0_EVENT.send(pin.is_high()).await;

    loop {
        pin.wait_for_any_edge().await;
        DI0_EVENT.send(pin.is_high()).await;
    }
}
