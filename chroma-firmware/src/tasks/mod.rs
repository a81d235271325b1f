//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod bus_link;
pub mod controller;
pub mod input;
pub mod pins;
pub mod tick;

pub use bus_link::{bus_rx_task, bus_tx_task};
pub use controller::controller_task;
pub use input::di0_task;
pub use pins::{pins_task, MasterPins};
pub use tick::tick_task;
