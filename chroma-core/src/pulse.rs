//! Host-triggered pulse train
//!
//! Writing PULSE_COUNT arms a generator that alternates the strips
//! between their on- and off-frames every half period, counting a pulse
//! down on each off phase. The firmware drives one [`tick`](PulseTrain::tick)
//! per millisecond and turns each phase into the same action set as a
//! LEDS_STATUS command write.

use crate::registers::RegisterBank;

/// One half-cycle of the pulse train
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulsePhase {
    /// Refresh the strips from the on-frames
    On,
    /// Blank the strips
    Off,
}

/// Millisecond-ticked pulse generator
#[derive(Debug, Clone, Default)]
pub struct PulseTrain {
    pending_start: bool,
    counter_ms: u16,
    last_on: bool,
}

impl PulseTrain {
    /// Create an idle train
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the train; the next tick emits the first On phase
    pub fn arm(&mut self) {
        self.pending_start = true;
    }

    /// Advance one millisecond
    ///
    /// `bank.pulse_count` is the live remaining-pulse register and is
    /// decremented here; `bank.pulse_period_ms` is read each tick, so a
    /// period change applies from the next toggle on.
    pub fn tick(&mut self, bank: &mut RegisterBank) -> Option<PulsePhase> {
        if self.pending_start {
            self.pending_start = false;
            self.counter_ms = 0;
            self.last_on = true;
            return Some(PulsePhase::On);
        }

        if bank.pulse_count == 0 {
            return None;
        }

        self.counter_ms = self.counter_ms.saturating_add(1);
        if self.counter_ms < bank.pulse_period_ms / 2 {
            return None;
        }
        self.counter_ms = 0;

        if self.last_on {
            self.last_on = false;
            bank.pulse_count -= 1;
            Some(PulsePhase::Off)
        } else {
            self.last_on = true;
            Some(PulsePhase::On)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    fn run_ms(
        train: &mut PulseTrain,
        bank: &mut RegisterBank,
        ms: u32,
    ) -> Vec<(u32, PulsePhase), 16> {
        let mut events = Vec::new();
        for t in 0..ms {
            if let Some(phase) = train.tick(bank) {
                let _ = events.push((t, phase));
            }
        }
        events
    }

    #[test]
    fn test_idle_train_is_silent() {
        let mut train = PulseTrain::new();
        let mut bank = RegisterBank::new();
        bank.pulse_count = 0;
        assert!(run_ms(&mut train, &mut bank, 1000).is_empty());
    }

    #[test]
    fn test_two_pulses_then_stop() {
        let mut train = PulseTrain::new();
        let mut bank = RegisterBank::new();
        bank.pulse_period_ms = 100;
        bank.pulse_count = 2;
        train.arm();

        let events = run_ms(&mut train, &mut bank, 1000);
        assert_eq!(
            events.as_slice(),
            &[
                (0, PulsePhase::On),
                (50, PulsePhase::Off),
                (100, PulsePhase::On),
                (150, PulsePhase::Off),
            ]
        );
        assert_eq!(bank.pulse_count, 0);
    }

    #[test]
    fn test_period_sets_spacing() {
        let mut train = PulseTrain::new();
        let mut bank = RegisterBank::new();
        bank.pulse_period_ms = 20;
        bank.pulse_count = 1;
        train.arm();

        let events = run_ms(&mut train, &mut bank, 100);
        assert_eq!(
            events.as_slice(),
            &[(0, PulsePhase::On), (10, PulsePhase::Off)]
        );
    }

    #[test]
    fn test_rearm_restarts() {
        let mut train = PulseTrain::new();
        let mut bank = RegisterBank::new();
        bank.pulse_period_ms = 40;
        bank.pulse_count = 1;
        train.arm();
        let _ = run_ms(&mut train, &mut bank, 100);

        bank.pulse_count = 1;
        train.arm();
        let events = run_ms(&mut train, &mut bank, 100);
        assert_eq!(events.first(), Some(&(0, PulsePhase::On)));
        assert_eq!(events.len(), 2);
    }
}
