//! Button codes, LED masks and expansion kinds.
//!
//! Button codes are bit flags; OR them together to test several buttons at
//! once with [`DeviceState::is_pressed`](crate::device::DeviceState::is_pressed).
//! Values follow the bit layout of the Wii Remote core-button report so the
//! HID backend can store the report word unchanged.

use serde::{Deserialize, Serialize};

/// LED masks for the four player lights.
pub mod leds {
    pub const NONE: u8 = 0x00;
    pub const LED_1: u8 = 0x10;
    pub const LED_2: u8 = 0x20;
    pub const LED_3: u8 = 0x40;
    pub const LED_4: u8 = 0x80;
    pub const ALL: u8 = LED_1 | LED_2 | LED_3 | LED_4;
}

/// Wii Remote core buttons.
pub mod buttons {
    pub const TWO: u16 = 0x0001;
    pub const ONE: u16 = 0x0002;
    pub const B: u16 = 0x0004;
    pub const A: u16 = 0x0008;
    pub const MINUS: u16 = 0x0010;
    pub const HOME: u16 = 0x0080;
    pub const LEFT: u16 = 0x0100;
    pub const RIGHT: u16 = 0x0200;
    pub const DOWN: u16 = 0x0400;
    pub const UP: u16 = 0x0800;
    pub const PLUS: u16 = 0x1000;
    pub const ALL: u16 = 0x1F9F;
}

/// Nunchuk buttons.
pub mod nunchuk {
    pub const Z: u16 = 0x01;
    pub const C: u16 = 0x02;
    pub const ALL: u16 = 0x03;
}

/// Classic Controller buttons.
pub mod classic {
    pub const UP: u16 = 0x0001;
    pub const LEFT: u16 = 0x0002;
    pub const ZR: u16 = 0x0004;
    pub const X: u16 = 0x0008;
    pub const A: u16 = 0x0010;
    pub const Y: u16 = 0x0020;
    pub const B: u16 = 0x0040;
    pub const ZL: u16 = 0x0080;
    pub const FULL_R: u16 = 0x0200;
    pub const PLUS: u16 = 0x0400;
    pub const HOME: u16 = 0x0800;
    pub const MINUS: u16 = 0x1000;
    pub const FULL_L: u16 = 0x2000;
    pub const DOWN: u16 = 0x4000;
    pub const RIGHT: u16 = 0x8000;
    pub const ALL: u16 = 0xFEFF;
}

/// Guitar Hero 3 controller buttons.
pub mod guitar {
    pub const STRUM_UP: u16 = 0x0001;
    pub const YELLOW: u16 = 0x0008;
    pub const GREEN: u16 = 0x0010;
    pub const BLUE: u16 = 0x0020;
    pub const RED: u16 = 0x0040;
    pub const ORANGE: u16 = 0x0080;
    pub const PLUS: u16 = 0x0400;
    pub const MINUS: u16 = 0x1000;
    pub const STRUM_DOWN: u16 = 0x4000;
    pub const ALL: u16 = 0xFEFF;
}

/// Accessory plugged into the Wii Remote's expansion port.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expansion {
    #[default]
    None,
    Nunchuk,
    Classic,
    GuitarHero3,
}
