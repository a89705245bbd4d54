//! Timed sequences that animate a light.
//!
//! An `Effect` only decides what the light state should be on each
//! tick. The controller owns the timer, sends one frame per tick and
//! drops the effect to cancel it. Every effect has a fixed number of
//! ticks and leaves the light in its idle state when it finishes.

use crate::LightState;
use tokio::time::Duration;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Kind {
    /// Blinks the light so a user can find it.
    Identify,
    /// Sweeps the hue once around the color wheel.
    Rainbow,
}

/// Tells the controller whether more ticks are needed.

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Step {
    Continue,
    Done,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Effect {
    kind: Kind,
    ticks: u32,
}

impl Effect {
    pub const IDENTIFY_PERIOD: Duration = Duration::from_millis(300);
    pub const IDENTIFY_TICKS: u32 = 10;
    pub const IDENTIFY_HUE: u16 = 100;

    pub const RAINBOW_PERIOD: Duration = Duration::from_millis(500);
    pub const RAINBOW_STEP: u16 = 10;

    /// Starts the identify flash. The light is set to a saturated
    /// green; the first tick turns it off.

    pub fn identify(state: &mut LightState) -> Self {
        state.hue = Self::IDENTIFY_HUE;
        state.saturation = 100;
        Effect {
            kind: Kind::Identify,
            ticks: 0,
        }
    }

    /// Starts a rainbow sweep beginning at red.

    pub fn rainbow(state: &mut LightState) -> Self {
        state.hue = 0;
        state.saturation = 100;
        Effect {
            kind: Kind::Rainbow,
            ticks: 0,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn period(&self) -> Duration {
        match self.kind {
            Kind::Identify => Self::IDENTIFY_PERIOD,
            Kind::Rainbow => Self::RAINBOW_PERIOD,
        }
    }

    /// The number of ticks the effect runs, including the final one
    /// that restores the idle state.

    pub fn total_ticks(&self) -> u32 {
        match self.kind {
            Kind::Identify => Self::IDENTIFY_TICKS,
            Kind::Rainbow => u32::from(360 / Self::RAINBOW_STEP) + 1,
        }
    }

    /// Advances the effect by one tick and updates `state`. Once
    /// `Step::Done` is returned, the state is idle and further calls
    /// leave it that way.

    pub fn tick(&mut self, state: &mut LightState) -> Step {
        self.ticks = self.ticks.saturating_add(1);

        if self.ticks >= self.total_ticks() {
            state.go_idle();
            return Step::Done;
        }

        match self.kind {
            Kind::Identify => {
                state.brightness = if self.ticks % 2 == 1 { 0 } else { 100 };
            }
            Kind::Rainbow => {
                // Each tick moves the hue further along the wheel; the
                // sweep makes one full revolution.

                state.hue = (self.ticks as u16 - 1) * Self::RAINBOW_STEP;
            }
        }
        Step::Continue
    }
}
