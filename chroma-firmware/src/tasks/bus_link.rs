//! Bus link tasks
//!
//! One RX/TX task pair per driver board link. The RX side turns raw
//! bytes into acknowledgement tokens for the controller; the TX side
//! drains the per-bus frame queue onto the wire.

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embedded_io_async::{Read, Write};

use chroma_core::bridge::BusId;
use chroma_protocol::EventToken;

use crate::channels::{BUS_EVENT, BUS_TX};

/// Bus RX task - receives acknowledgement tokens from one driver board
#[embassy_executor::task(pool_size = 2)]
pub async fn bus_rx_task(bus: BusId, mut rx: BufferedUartRx) {
    info!("Bus {:?} RX task started", bus);

    let mut buf = [0u8; 16];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                for &byte in &buf[..n] {
                    match EventToken::from_byte(byte) {
                        Some(token) => BUS_EVENT.send((bus, token)).await,
                        None => warn!("Bus {:?}: unknown token byte {:02x}", bus, byte),
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Bus {:?} read error: {:?}", bus, e);
            }
        }
    }
}

/// Bus TX task - sends queued frames to one driver board
#[embassy_executor::task(pool_size = 2)]
pub async fn bus_tx_task(bus: BusId, mut tx: BufferedUartTx) {
    info!("Bus {:?} TX task started", bus);

    loop {
        let frame = BUS_TX[bus.index()].receive().await;
        if let Err(e) = tx.write_all(&frame).await {
            warn!("Bus {:?} write error: {:?}", bus, e);
        }
    }
}
