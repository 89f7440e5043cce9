//! Player indicator assignment.
//!
//! Each newly connected controller lights one of the four player LEDs in
//! connection order: the first gets LED 1, the second LED 2 and so on. There
//! are only four lights; a fifth controller gets no indicator and the first
//! four are left alone. A light freed by a disconnect goes to the next
//! controller that connects.

use crate::backends::ControllerIo;
use crate::constants::leds;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four player lights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Indicator {
    One,
    Two,
    Three,
    Four,
}

impl Indicator {
    pub const ALL: [Indicator; 4] = [
        Indicator::One,
        Indicator::Two,
        Indicator::Three,
        Indicator::Four,
    ];

    /// Indicator for the next controller to connect, given the indicators
    /// held by controllers that are still connected.
    ///
    /// Picks the lowest free light. Without disconnects in between this is
    /// plain connection order: the first controller gets `One`, the fourth
    /// `Four`, the fifth nothing.
    pub fn next_free(held: impl IntoIterator<Item = Indicator>) -> Option<Indicator> {
        let taken = held
            .into_iter()
            .fold(0u8, |acc, ind| acc | ind.mask());
        Self::ALL.into_iter().find(|ind| taken & ind.mask() == 0)
    }

    /// Player number, 1..=4.
    pub fn number(self) -> u8 {
        match self {
            Indicator::One => 1,
            Indicator::Two => 2,
            Indicator::Three => 3,
            Indicator::Four => 4,
        }
    }

    /// LED mask lighting only this indicator.
    pub fn mask(self) -> u8 {
        match self {
            Indicator::One => leds::LED_1,
            Indicator::Two => leds::LED_2,
            Indicator::Three => leds::LED_3,
            Indicator::Four => leds::LED_4,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.number())
    }
}

/// Light `indicator` on the device in `slot`.
///
/// Returns whether the command reached the device. A failure is logged and
/// otherwise ignored; the device stays connected and usable.
pub fn assign<I: ControllerIo + ?Sized>(io: &mut I, slot: usize, indicator: Indicator) -> bool {
    match io.set_leds(slot, indicator.mask()) {
        Ok(()) => {
            tracing::debug!(slot, %indicator, "indicator lit");
            true
        }
        Err(e) => {
            tracing::warn!(slot, %indicator, error = %e, "failed to light indicator");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::MockIo;
    use std::time::Duration;

    #[test]
    fn connection_order_maps_one_to_one() {
        let mut held = Vec::new();
        for expected in Indicator::ALL {
            let next = Indicator::next_free(held.iter().copied());
            assert_eq!(next, Some(expected));
            held.push(expected);
        }
    }

    #[test]
    fn fifth_gets_nothing() {
        assert_eq!(Indicator::next_free(Indicator::ALL), None);
    }

    #[test]
    fn freed_light_is_reused_first() {
        let held = [Indicator::One, Indicator::Three, Indicator::Four];
        assert_eq!(Indicator::next_free(held), Some(Indicator::Two));
        assert_eq!(Indicator::next_free([Indicator::Two]), Some(Indicator::One));
    }

    #[test]
    fn assign_reports_led_failure() {
        let (mut io, radio) = MockIo::new(1);
        radio.place_in_range(1);
        io.find(1, Duration::ZERO);
        io.connect(1);

        assert!(assign(&mut io, 0, Indicator::Two));
        radio.fail_leds(true);
        assert!(!assign(&mut io, 0, Indicator::Three));
        assert_eq!(radio.calls().leds, vec![(0, leds::LED_2), (0, leds::LED_3)]);
    }

    #[test]
    fn masks_are_distinct_single_leds() {
        let masks: Vec<u8> = Indicator::ALL.iter().map(|i| i.mask()).collect();
        assert_eq!(masks, vec![leds::LED_1, leds::LED_2, leds::LED_3, leds::LED_4]);
        for m in masks {
            assert_eq!(m.count_ones(), 1);
        }
    }

    #[test]
    fn numbers_and_display() {
        assert_eq!(Indicator::Three.number(), 3);
        assert_eq!(Indicator::Four.to_string(), "P4");
    }
}
