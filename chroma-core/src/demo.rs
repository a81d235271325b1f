//! Demo animation step generator
//!
//! A deterministic sequence over the current LED count: a single lit
//! pixel sweeps the strip through four color phases, the whole strip
//! blinks, then brightness ramps up and back down. The driver firmware
//! renders one step at a time and checks its live demo-enable flag
//! between steps, so cancellation latency is bounded by the longest step
//! delay.

use chroma_protocol::ColorFrame;

/// Delay between sweep steps
pub const SWEEP_STEP_MS: u16 = 50;

/// Delay between blink steps
pub const BLINK_STEP_MS: u16 = 250;

/// Delay between ramp steps
pub const RAMP_STEP_MS: u16 = 20;

/// Longest single step; bounds cancellation latency
pub const MAX_STEP_MS: u16 = 250;

const SWEEP_LEVEL: u8 = 128;
const WHITE_LEVEL: u8 = 32;
const BLINK_LEVEL: u8 = 64;
const RAMP_TOP: u8 = 128;

/// Sweep phases: one per strip channel, then a white-ish pass
const SWEEP_PHASES: u8 = 4;

/// Off/on blink steps (starts and ends dark)
const BLINK_STEPS: u8 = 7;

/// One frame of the animation and how long to hold it
#[derive(Debug, Clone)]
pub struct DemoStep {
    pub frame: ColorFrame,
    pub delay_ms: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Sweep { phase: u8, pos: u8 },
    Blink { step: u8 },
    RampUp { level: u8 },
    RampDown { level: u8 },
    Rest,
}

/// Generates the demo animation one step at a time
#[derive(Debug, Clone)]
pub struct DemoSequencer {
    count: u8,
    phase: Phase,
}

impl DemoSequencer {
    /// Create a sequencer over `count` LEDs (clamped to at least one)
    pub fn new(count: u8) -> Self {
        Self {
            count: count.max(1),
            phase: Phase::Sweep { phase: 0, pos: 0 },
        }
    }

    /// LED count the animation runs over
    pub fn led_count(&self) -> u8 {
        self.count
    }

    /// Steps in one full animation cycle
    pub fn cycle_len(&self) -> u32 {
        u32::from(SWEEP_PHASES) * u32::from(self.count)
            + u32::from(BLINK_STEPS)
            + 2 * u32::from(RAMP_TOP)
            + 1
    }

    /// Produce the current frame and advance to the next step
    pub fn next_step(&mut self) -> DemoStep {
        match self.phase {
            Phase::Sweep { phase, pos } => {
                let mut frame = ColorFrame::blank(self.count);
                let pixel = &mut frame.pixels_mut()[pos as usize];
                if phase < 3 {
                    pixel[phase as usize] = SWEEP_LEVEL;
                } else {
                    *pixel = [WHITE_LEVEL; 3];
                }

                self.phase = if pos + 1 < self.count {
                    Phase::Sweep { phase, pos: pos + 1 }
                } else if phase + 1 < SWEEP_PHASES {
                    Phase::Sweep {
                        phase: phase + 1,
                        pos: 0,
                    }
                } else {
                    Phase::Blink { step: 0 }
                };

                DemoStep {
                    frame,
                    delay_ms: SWEEP_STEP_MS,
                }
            }
            Phase::Blink { step } => {
                let frame = if step % 2 == 0 {
                    ColorFrame::blank(self.count)
                } else {
                    ColorFrame::filled(self.count, [BLINK_LEVEL; 3])
                };

                self.phase = if step + 1 < BLINK_STEPS {
                    Phase::Blink { step: step + 1 }
                } else {
                    Phase::RampUp { level: 0 }
                };

                DemoStep {
                    frame,
                    delay_ms: BLINK_STEP_MS,
                }
            }
            Phase::RampUp { level } => {
                let frame = ColorFrame::filled(self.count, [level; 3]);

                self.phase = if level + 1 < RAMP_TOP {
                    Phase::RampUp { level: level + 1 }
                } else {
                    Phase::RampDown { level: RAMP_TOP }
                };

                DemoStep {
                    frame,
                    delay_ms: RAMP_STEP_MS,
                }
            }
            Phase::RampDown { level } => {
                let frame = ColorFrame::filled(self.count, [level; 3]);

                self.phase = if level > 1 {
                    Phase::RampDown { level: level - 1 }
                } else {
                    Phase::Rest
                };

                DemoStep {
                    frame,
                    delay_ms: RAMP_STEP_MS,
                }
            }
            Phase::Rest => {
                self.phase = Phase::Sweep { phase: 0, pos: 0 };
                DemoStep {
                    frame: ColorFrame::blank(self.count),
                    delay_ms: BLINK_STEP_MS,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sweep_step() {
        let mut demo = DemoSequencer::new(8);
        let step = demo.next_step();

        assert_eq!(step.delay_ms, SWEEP_STEP_MS);
        assert_eq!(step.frame.len(), 8);
        assert_eq!(step.frame.pixels()[0], [SWEEP_LEVEL, 0, 0]);
        assert!(step.frame.pixels()[1..].iter().all(|p| *p == [0, 0, 0]));
    }

    #[test]
    fn test_sweep_walks_the_strip() {
        let mut demo = DemoSequencer::new(4);
        let _ = demo.next_step();
        let step = demo.next_step();
        assert_eq!(step.frame.pixels()[0], [0, 0, 0]);
        assert_eq!(step.frame.pixels()[1], [SWEEP_LEVEL, 0, 0]);
    }

    #[test]
    fn test_white_phase_lights_all_channels() {
        let mut demo = DemoSequencer::new(2);
        // Skip the three single-channel passes
        for _ in 0..6 {
            let _ = demo.next_step();
        }
        let step = demo.next_step();
        assert_eq!(step.frame.pixels()[0], [WHITE_LEVEL; 3]);
    }

    #[test]
    fn test_blink_alternates_starting_dark() {
        let mut demo = DemoSequencer::new(2);
        for _ in 0..8 {
            let _ = demo.next_step();
        }

        // First blink step is dark, second is lit
        let dark = demo.next_step();
        assert_eq!(dark.delay_ms, BLINK_STEP_MS);
        assert!(dark.frame.pixels().iter().all(|p| *p == [0, 0, 0]));

        let lit = demo.next_step();
        assert!(lit.frame.pixels().iter().all(|p| *p == [BLINK_LEVEL; 3]));
    }

    #[test]
    fn test_cycle_wraps_to_sweep() {
        let mut demo = DemoSequencer::new(3);
        let cycle = demo.cycle_len();
        let first = demo.next_step();
        for _ in 1..cycle {
            let _ = demo.next_step();
        }

        // Next step begins the cycle again
        let wrapped = demo.next_step();
        assert_eq!(wrapped.frame.pixels(), first.frame.pixels());
        assert_eq!(wrapped.delay_ms, first.delay_ms);
    }

    #[test]
    fn test_every_delay_bounded() {
        let mut demo = DemoSequencer::new(5);
        for _ in 0..demo.cycle_len() {
            assert!(demo.next_step().delay_ms <= MAX_STEP_MS);
        }
    }

    #[test]
    fn test_ramp_reaches_top_and_returns() {
        let mut demo = DemoSequencer::new(1);
        // 4 sweep + 7 blink steps
        for _ in 0..11 {
            let _ = demo.next_step();
        }

        let mut peak = 0u8;
        let mut last = 0u8;
        for _ in 0..(2 * RAMP_TOP as u32) {
            let step = demo.next_step();
            last = step.frame.pixels()[0][0];
            peak = peak.max(last);
        }
        assert_eq!(peak, RAMP_TOP);
        assert_eq!(last, 1);
    }

    #[test]
    fn test_zero_count_clamped() {
        let mut demo = DemoSequencer::new(0);
        assert_eq!(demo.led_count(), 1);
        assert_eq!(demo.next_step().frame.len(), 1);
    }
}
