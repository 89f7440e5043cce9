//! Wii Remote HID report codec.
//!
//! Pure functions for building output reports and decoding input reports.
//! Buffers always start with the report ID byte, the way `hidapi` delivers
//! and expects them.
//!
//! Only what the [`hid`](super::hid) backend needs is covered: LEDs, rumble,
//! reporting mode, status, register access, core buttons, accelerometer and
//! the extended IR format.

use crate::constants::{buttons, Expansion};
use crate::device::{IrDot, IrState, Orientation};

/// Nintendo.
pub const VENDOR_ID: u16 = 0x057e;
/// RVL-CNT-01 and RVL-CNT-01-TR.
pub const PRODUCT_IDS: [u16; 2] = [0x0306, 0x0330];

pub mod output {
    pub const RUMBLE: u8 = 0x10;
    pub const LEDS: u8 = 0x11;
    pub const REPORT_MODE: u8 = 0x12;
    pub const IR_ENABLE: u8 = 0x13;
    pub const STATUS_REQUEST: u8 = 0x15;
    pub const WRITE_MEMORY: u8 = 0x16;
    pub const READ_MEMORY: u8 = 0x17;
    pub const IR_ENABLE_2: u8 = 0x1a;
}

pub mod input {
    pub const STATUS: u8 = 0x20;
    pub const READ_DATA: u8 = 0x21;
    pub const ACK: u8 = 0x22;
    pub const BUTTONS: u8 = 0x30;
    pub const BUTTONS_ACCEL: u8 = 0x31;
    pub const BUTTONS_ACCEL_IR: u8 = 0x33;
}

/// Longest input report.
pub const MAX_REPORT_LEN: usize = 22;

/// Control-register address space flag for memory reads/writes.
const REGISTER_SPACE: u8 = 0x04;

const IR_REG_ENABLE: u32 = 0xb0_0030;
const IR_REG_BLOCK_1: u32 = 0xb0_0000;
const IR_REG_BLOCK_2: u32 = 0xb0_001a;
const IR_REG_MODE: u32 = 0xb0_0033;
/// Sensitivity level 3.
const IR_BLOCK_1: [u8; 9] = [0x02, 0x00, 0x00, 0x71, 0x01, 0x00, 0xaa, 0x00, 0x64];
const IR_BLOCK_2: [u8; 2] = [0x63, 0x03];
const IR_MODE_EXTENDED: u8 = 0x03;

const EXP_REG_INIT_1: u32 = 0xa4_00f0;
const EXP_REG_INIT_2: u32 = 0xa4_00fb;
/// Expansion identifier, six bytes.
pub const EXP_REG_ID: u32 = 0xa4_00fa;

/// Nominal accelerometer zero point (raw counts).
pub const ACCEL_ZERO: f32 = 128.0;
/// Nominal counts per g.
pub const ACCEL_ONE_G: f32 = 26.0;
/// Exponential smoothing factor for `pitch` / `roll`.
pub const ORIENT_SMOOTHING: f32 = 0.07;

/// IR camera resolution.
pub const IR_WIDTH: i32 = 1024;
pub const IR_HEIGHT: i32 = 768;
/// Sensor bar LED cluster spacing, metres.
pub const SENSOR_BAR_WIDTH_M: f32 = 0.205;
/// Camera focal length in pixels (about 41° horizontal field of view).
pub const IR_FOCAL_PX: f32 = 1368.0;

#[inline]
fn rumble_bit(rumble: bool) -> u8 {
    rumble as u8
}

pub fn rumble(on: bool) -> [u8; 2] {
    [output::RUMBLE, rumble_bit(on)]
}

pub fn leds(mask: u8, rumble: bool) -> [u8; 2] {
    [output::LEDS, (mask & 0xf0) | rumble_bit(rumble)]
}

pub fn status_request(rumble: bool) -> [u8; 2] {
    [output::STATUS_REQUEST, rumble_bit(rumble)]
}

/// Input report the device should send given the enabled capabilities.
pub fn mode_for(motion: bool, ir: bool) -> u8 {
    match (motion, ir) {
        (_, true) => input::BUTTONS_ACCEL_IR,
        (true, false) => input::BUTTONS_ACCEL,
        (false, false) => input::BUTTONS,
    }
}

/// Select the reporting mode; reports are only sent on change.
pub fn report_mode(mode: u8, rumble: bool) -> [u8; 3] {
    [output::REPORT_MODE, rumble_bit(rumble), mode]
}

/// Write up to 16 bytes into the control-register space.
pub fn write_register(address: u32, data: &[u8], rumble: bool) -> [u8; 22] {
    let len = data.len().min(16);
    let mut out = [0u8; 22];
    out[0] = output::WRITE_MEMORY;
    out[1] = REGISTER_SPACE | rumble_bit(rumble);
    out[2..5].copy_from_slice(&address.to_be_bytes()[1..]);
    out[5] = len as u8;
    out[6..6 + len].copy_from_slice(&data[..len]);
    out
}

/// Read `size` bytes from the control-register space.
pub fn read_register(address: u32, size: u16, rumble: bool) -> [u8; 7] {
    let a = address.to_be_bytes();
    let s = size.to_be_bytes();
    [
        output::READ_MEMORY,
        REGISTER_SPACE | rumble_bit(rumble),
        a[1],
        a[2],
        a[3],
        s[0],
        s[1],
    ]
}

/// Camera power reports followed by the register writes that start extended
/// mode tracking.
pub fn ir_enable_sequence(rumble: bool) -> Vec<Vec<u8>> {
    let r = rumble_bit(rumble);
    vec![
        vec![output::IR_ENABLE, 0x04 | r],
        vec![output::IR_ENABLE_2, 0x04 | r],
        write_register(IR_REG_ENABLE, &[0x08], rumble).to_vec(),
        write_register(IR_REG_BLOCK_1, &IR_BLOCK_1, rumble).to_vec(),
        write_register(IR_REG_BLOCK_2, &IR_BLOCK_2, rumble).to_vec(),
        write_register(IR_REG_MODE, &[IR_MODE_EXTENDED], rumble).to_vec(),
        write_register(IR_REG_ENABLE, &[0x08], rumble).to_vec(),
    ]
}

pub fn ir_disable_sequence(rumble: bool) -> Vec<Vec<u8>> {
    let r = rumble_bit(rumble);
    vec![vec![output::IR_ENABLE, r], vec![output::IR_ENABLE_2, r]]
}

/// Disable expansion encryption and ask for the identifier.
pub fn expansion_identify_sequence(rumble: bool) -> Vec<Vec<u8>> {
    vec![
        write_register(EXP_REG_INIT_1, &[0x55], rumble).to_vec(),
        write_register(EXP_REG_INIT_2, &[0x00], rumble).to_vec(),
        read_register(EXP_REG_ID, 6, rumble).to_vec(),
    ]
}

/// Decoded input report.
#[derive(Clone, Debug, PartialEq)]
pub enum InputReport {
    Status {
        buttons: u16,
        extension: bool,
        ir: bool,
        leds: u8,
        battery: u8,
    },
    ReadData {
        buttons: u16,
        error: u8,
        /// Low 16 bits of the address read.
        address: u16,
        data: Vec<u8>,
    },
    Ack {
        buttons: u16,
        report: u8,
        error: u8,
    },
    Buttons {
        buttons: u16,
    },
    ButtonsAccel {
        buttons: u16,
        accel: [u8; 3],
    },
    ButtonsAccelIr {
        buttons: u16,
        accel: [u8; 3],
        dots: [IrDot; 4],
    },
    /// Recognized framing, unsupported report ID.
    Other(u8),
}

/// Decode one input report. `None` if it is too short for its ID.
pub fn parse(data: &[u8]) -> Option<InputReport> {
    let (&id, _) = data.split_first()?;
    let need = match id {
        input::STATUS => 7,
        input::READ_DATA => 6,
        input::ACK => 5,
        input::BUTTONS => 3,
        input::BUTTONS_ACCEL => 6,
        input::BUTTONS_ACCEL_IR => 18,
        other => return Some(InputReport::Other(other)),
    };
    if data.len() < need {
        return None;
    }

    let buttons = u16::from_be_bytes([data[1], data[2]]) & buttons::ALL;
    let report = match id {
        input::STATUS => InputReport::Status {
            buttons,
            extension: data[3] & 0x02 != 0,
            ir: data[3] & 0x08 != 0,
            leds: data[3] & 0xf0,
            battery: data[6],
        },
        input::READ_DATA => {
            let size = ((data[3] >> 4) + 1) as usize;
            let end = (6 + size).min(data.len());
            InputReport::ReadData {
                buttons,
                error: data[3] & 0x0f,
                address: u16::from_be_bytes([data[4], data[5]]),
                data: data[6..end].to_vec(),
            }
        }
        input::ACK => InputReport::Ack {
            buttons,
            report: data[3],
            error: data[4],
        },
        input::BUTTONS => InputReport::Buttons { buttons },
        input::BUTTONS_ACCEL => InputReport::ButtonsAccel {
            buttons,
            accel: [data[3], data[4], data[5]],
        },
        _ => {
            let mut dots = [IrDot::default(); 4];
            for (dot, chunk) in dots.iter_mut().zip(data[6..18].chunks_exact(3)) {
                *dot = decode_ir_dot(chunk);
            }
            InputReport::ButtonsAccelIr {
                buttons,
                accel: [data[3], data[4], data[5]],
                dots,
            }
        }
    };
    Some(report)
}

/// Extended-mode IR dot: 10-bit x and y, size nibble. All `0xff` = not seen.
fn decode_ir_dot(b: &[u8]) -> IrDot {
    if b[0] == 0xff && b[1] == 0xff && b[2] == 0xff {
        return IrDot::default();
    }
    IrDot {
        visible: true,
        x: b[0] as i32 | (((b[2] >> 4) & 0x03) as i32) << 8,
        y: b[1] as i32 | (((b[2] >> 6) & 0x03) as i32) << 8,
    }
}

/// Identify the expansion from the six identifier bytes.
pub fn expansion_from_id(id: &[u8]) -> Option<Expansion> {
    if id.len() < 6 {
        return None;
    }
    match (id[4], id[5]) {
        (0x00, 0x00) => Some(Expansion::Nunchuk),
        (0x01, 0x01) => Some(Expansion::Classic),
        (0x01, 0x03) => Some(Expansion::GuitarHero3),
        _ => None,
    }
}

/// Update orientation from a raw accelerometer sample.
///
/// `abs_*` are the instantaneous angles; `pitch` / `roll` follow them with
/// exponential smoothing. `yaw` is left untouched (it comes from IR).
pub fn orientation(accel: [u8; 3], previous: Orientation) -> Orientation {
    let g = |raw: u8| (raw as f32 - ACCEL_ZERO) / ACCEL_ONE_G;
    let (x, y, z) = (g(accel[0]), g(accel[1]), g(accel[2]));

    let abs_roll = x.atan2(z).to_degrees();
    let abs_pitch = y.atan2(z).to_degrees();

    Orientation {
        yaw: previous.yaw,
        roll: previous.roll + ORIENT_SMOOTHING * (abs_roll - previous.roll),
        pitch: previous.pitch + ORIENT_SMOOTHING * (abs_pitch - previous.pitch),
        abs_roll,
        abs_pitch,
    }
}

/// Cursor, depth and yaw from the first two visible dots.
///
/// Returns `(state, yaw)`; with fewer than two dots the cursor and depth
/// keep their previous values and yaw is `None`.
pub fn ir_pointer(dots: [IrDot; 4], previous: IrState) -> (IrState, Option<f32>) {
    let mut visible = dots.iter().filter(|d| d.visible);
    let (Some(a), Some(b)) = (visible.next(), visible.next()) else {
        return (IrState { dots, ..previous }, None);
    };

    let mx = (a.x + b.x) as f32 / 2.0;
    let my = (a.y + b.y) as f32 / 2.0;
    let sep = (((a.x - b.x).pow(2) + (a.y - b.y).pow(2)) as f32).sqrt();

    // The camera image is mirrored on both axes relative to the pointer.
    let x = (IR_WIDTH - 1 - mx.round() as i32).clamp(0, IR_WIDTH - 1);
    let y = (IR_HEIGHT - 1 - my.round() as i32).clamp(0, IR_HEIGHT - 1);
    let z = if sep > 0.0 {
        SENSOR_BAR_WIDTH_M * IR_FOCAL_PX / sep
    } else {
        previous.z
    };
    let yaw = ((IR_WIDTH as f32 / 2.0 - mx) / IR_FOCAL_PX).atan().to_degrees();

    (IrState { dots, x, y, z }, Some(yaw))
}
