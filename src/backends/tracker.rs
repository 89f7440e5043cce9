//! Per-remote report state machine.
//!
//! [`RemoteTracker`] folds decoded [`InputReport`]s into a [`SlotState`] and
//! decides which raw transition code each poll leaves behind. The follow-up
//! output reports it needs (reporting mode after a status report, expansion
//! probing) go through a [`ReportWriter`], so the whole thing runs without a
//! device attached.
//!
//! One transition is surfaced per poll. Transitions that arrive together are
//! queued and come out on the following polls, in arrival order. A poll with
//! only input changes leaves `EVENT`; a quiet poll leaves `NONE`.

use crate::backends::report::{self, InputReport};
use crate::constants::Expansion;
use crate::device::SlotState;
use crate::error::Result;
use crate::event::raw;
use std::collections::VecDeque;

/// Sink for output reports.
pub trait ReportWriter {
    fn write_report(&mut self, data: &[u8]) -> Result<()>;
}

/// Transition and expansion bookkeeping for one connected remote.
#[derive(Debug)]
pub struct RemoteTracker {
    rumble: bool,
    extension_present: bool,
    identifying_expansion: bool,
    backlog: VecDeque<u8>,
}

impl Default for RemoteTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteTracker {
    /// Tracker for a freshly opened remote; its first poll reports `CONNECT`.
    pub fn new() -> Self {
        Self {
            rumble: false,
            extension_present: false,
            identifying_expansion: false,
            backlog: VecDeque::from([raw::CONNECT]),
        }
    }

    #[inline]
    pub fn rumble(&self) -> bool {
        self.rumble
    }

    /// Record the motor state so later output reports carry the rumble bit.
    #[inline]
    pub fn set_rumble(&mut self, on: bool) {
        self.rumble = on;
    }

    /// Transitions waiting for a later poll.
    #[inline]
    pub fn queued(&self) -> usize {
        self.backlog.len()
    }

    /// Reset the per-poll fields of `state`.
    pub fn begin_poll(state: &mut SlotState) {
        state.event = raw::NONE;
        state.buttons_pressed = 0;
    }

    /// Fold one report into `state`. Returns whether input changed.
    ///
    /// Output writes that fail are logged; the remote stays connected.
    pub fn apply<W: ReportWriter + ?Sized>(
        &mut self,
        input: InputReport,
        state: &mut SlotState,
        out: &mut W,
    ) -> bool {
        match input {
            InputReport::Buttons { buttons } => update_buttons(state, buttons),
            InputReport::ButtonsAccel { buttons, accel } => {
                let b = update_buttons(state, buttons);
                if state.motion_sensing {
                    state.orientation = report::orientation(accel, state.orientation);
                }
                b || state.motion_sensing
            }
            InputReport::ButtonsAccelIr {
                buttons,
                accel,
                dots,
            } => {
                update_buttons(state, buttons);
                if state.motion_sensing {
                    state.orientation = report::orientation(accel, state.orientation);
                }
                if state.ir_tracking {
                    let (ir, yaw) = report::ir_pointer(dots, state.ir);
                    state.ir = ir;
                    if let Some(yaw) = yaw {
                        state.orientation.yaw = yaw;
                    }
                }
                true
            }
            InputReport::Status {
                buttons,
                extension,
                leds,
                battery,
                ..
            } => {
                update_buttons(state, buttons);
                tracing::debug!(leds, battery, "status");
                self.backlog.push_back(raw::STATUS);
                self.on_extension_flag(extension, state, out);
                // A status report resets the reporting mode.
                let mode = report::mode_for(state.motion_sensing, state.ir_tracking);
                send(out, &report::report_mode(mode, self.rumble));
                true
            }
            InputReport::ReadData {
                buttons,
                error,
                address,
                data,
            } => {
                update_buttons(state, buttons);
                if self.identifying_expansion && address == (report::EXP_REG_ID & 0xffff) as u16 {
                    self.identifying_expansion = false;
                    if error != 0 {
                        tracing::warn!(error, "expansion identification failed");
                    } else if let Some(exp) = report::expansion_from_id(&data) {
                        state.expansion = exp;
                        state.expansion_buttons = 0;
                        self.backlog.push_back(inserted_code(exp));
                    } else {
                        tracing::warn!(id = ?data, "unknown expansion");
                    }
                } else {
                    self.backlog.push_back(raw::READ_DATA);
                }
                true
            }
            InputReport::Ack {
                buttons,
                report: id,
                error,
            } => {
                if error != 0 {
                    tracing::debug!(report = id, error, "output report rejected");
                }
                update_buttons(state, buttons)
            }
            InputReport::Other(id) => {
                tracing::debug!(id, "unhandled report");
                false
            }
        }
    }

    /// Leave this poll's transition code in `state.event`.
    pub fn end_poll(&mut self, state: &mut SlotState, changed: bool) {
        state.event = match self.backlog.pop_front() {
            Some(code) => code,
            None if changed => raw::EVENT,
            None => raw::NONE,
        };
    }

    /// The link failed; queued transitions are superseded by the disconnect.
    pub fn fail(&mut self, state: &mut SlotState) {
        self.backlog.clear();
        state.connected = false;
        state.event = raw::UNEXPECTED_DISCONNECT;
    }

    fn on_extension_flag<W: ReportWriter + ?Sized>(
        &mut self,
        present: bool,
        state: &mut SlotState,
        out: &mut W,
    ) {
        if present && !self.extension_present {
            self.identifying_expansion = true;
            for r in report::expansion_identify_sequence(self.rumble) {
                send(out, &r);
            }
        } else if !present && self.extension_present {
            self.identifying_expansion = false;
            let removed = std::mem::take(&mut state.expansion);
            state.expansion_buttons = 0;
            if let Some(code) = removed_code(removed) {
                self.backlog.push_back(code);
            }
        }
        self.extension_present = present;
    }
}

fn send<W: ReportWriter + ?Sized>(out: &mut W, data: &[u8]) {
    if let Err(e) = out.write_report(data) {
        tracing::warn!(report = ?data.first(), error = %e, "output report failed");
    }
}

fn update_buttons(state: &mut SlotState, buttons: u16) -> bool {
    let previous = state.buttons;
    state.buttons_pressed |= buttons & !previous;
    state.buttons = buttons;
    previous != buttons
}

fn inserted_code(exp: Expansion) -> u8 {
    match exp {
        Expansion::Nunchuk => raw::NUNCHUK_INSERTED,
        Expansion::Classic => raw::CLASSIC_INSERTED,
        Expansion::GuitarHero3 => raw::GUITAR_INSERTED,
        Expansion::None => raw::EVENT,
    }
}

fn removed_code(exp: Expansion) -> Option<u8> {
    match exp {
        Expansion::Nunchuk => Some(raw::NUNCHUK_REMOVED),
        Expansion::Classic => Some(raw::CLASSIC_REMOVED),
        Expansion::GuitarHero3 => Some(raw::GUITAR_REMOVED),
        Expansion::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::buttons;
    use crate::error::Error;

    #[derive(Default)]
    struct Wire {
        sent: Vec<Vec<u8>>,
        broken: bool,
    }

    impl ReportWriter for Wire {
        fn write_report(&mut self, data: &[u8]) -> Result<()> {
            if self.broken {
                return Err(Error::Io("write failed".into()));
            }
            self.sent.push(data.to_vec());
            Ok(())
        }
    }

    fn status(extension: bool) -> InputReport {
        InputReport::Status {
            buttons: 0,
            extension,
            ir: false,
            leds: 0x10,
            battery: 0xc0,
        }
    }

    fn id_read(id: [u8; 6]) -> InputReport {
        InputReport::ReadData {
            buttons: 0,
            error: 0,
            address: 0x00fa,
            data: id.to_vec(),
        }
    }

    const NUNCHUK_ID: [u8; 6] = [0x00, 0x00, 0xa4, 0x20, 0x00, 0x00];

    /// Run one poll over `reports` and return the code it leaves.
    fn poll(
        t: &mut RemoteTracker,
        state: &mut SlotState,
        wire: &mut Wire,
        reports: Vec<InputReport>,
    ) -> u8 {
        RemoteTracker::begin_poll(state);
        let mut changed = false;
        for r in reports {
            changed |= t.apply(r, state, wire);
        }
        t.end_poll(state, changed);
        state.event
    }

    #[test]
    fn first_poll_reports_connect_then_input_then_quiet() {
        let mut t = RemoteTracker::new();
        let mut st = SlotState::connected();
        let mut wire = Wire::default();

        assert_eq!(poll(&mut t, &mut st, &mut wire, vec![]), raw::CONNECT);
        let press = InputReport::Buttons { buttons: buttons::A };
        assert_eq!(poll(&mut t, &mut st, &mut wire, vec![press]), raw::EVENT);
        assert!(st.buttons_pressed & buttons::A != 0);
        assert_eq!(poll(&mut t, &mut st, &mut wire, vec![]), raw::NONE);
        assert_eq!(st.buttons_pressed, 0);
        assert_eq!(st.buttons, buttons::A);
    }

    #[test]
    fn presses_within_one_poll_accumulate() {
        let mut t = RemoteTracker::new();
        let mut st = SlotState::connected();
        let mut wire = Wire::default();
        poll(&mut t, &mut st, &mut wire, vec![]);

        let reports = vec![
            InputReport::Buttons { buttons: buttons::B },
            InputReport::Buttons { buttons: 0 },
            InputReport::Buttons { buttons: buttons::HOME },
        ];
        poll(&mut t, &mut st, &mut wire, reports);
        assert_eq!(st.buttons_pressed, buttons::B | buttons::HOME);
        assert_eq!(st.buttons, buttons::HOME);
    }

    #[test]
    fn queued_transitions_come_out_one_per_poll_in_order() {
        let mut t = RemoteTracker::new();
        let mut st = SlotState::connected();
        let mut wire = Wire::default();
        poll(&mut t, &mut st, &mut wire, vec![]);

        // Expansion plugged in: status, then the identification reply, in one poll.
        let code = poll(&mut t, &mut st, &mut wire, vec![status(true), id_read(NUNCHUK_ID)]);
        assert_eq!(code, raw::STATUS);
        assert_eq!(t.queued(), 1);
        assert_eq!(st.expansion, Expansion::Nunchuk);

        assert_eq!(poll(&mut t, &mut st, &mut wire, vec![]), raw::NUNCHUK_INSERTED);
        assert_eq!(poll(&mut t, &mut st, &mut wire, vec![]), raw::NONE);
    }

    #[test]
    fn status_with_new_extension_sends_identify_and_mode() {
        let mut t = RemoteTracker::new();
        let mut st = SlotState::connected();
        st.motion_sensing = true;
        let mut wire = Wire::default();

        t.apply(status(true), &mut st, &mut wire);
        let mut expected = report::expansion_identify_sequence(false);
        expected.push(report::report_mode(0x31, false).to_vec());
        assert_eq!(wire.sent, expected);

        // Same flag again: no second identification.
        wire.sent.clear();
        t.apply(status(true), &mut st, &mut wire);
        assert_eq!(wire.sent, vec![report::report_mode(0x31, false).to_vec()]);
    }

    #[test]
    fn identification_reply_is_not_a_read_event() {
        let mut t = RemoteTracker::new();
        let mut st = SlotState::connected();
        let mut wire = Wire::default();
        poll(&mut t, &mut st, &mut wire, vec![]);
        poll(&mut t, &mut st, &mut wire, vec![status(true)]);

        let classic = [0x00, 0x00, 0xa4, 0x20, 0x01, 0x01];
        assert_eq!(
            poll(&mut t, &mut st, &mut wire, vec![id_read(classic)]),
            raw::CLASSIC_INSERTED
        );
        assert_eq!(t.queued(), 0);

        // Without an identification outstanding the same address is a plain read.
        assert_eq!(
            poll(&mut t, &mut st, &mut wire, vec![id_read(classic)]),
            raw::READ_DATA
        );
    }

    #[test]
    fn removing_expansion_reports_matching_code() {
        let mut t = RemoteTracker::new();
        let mut st = SlotState::connected();
        let mut wire = Wire::default();
        poll(&mut t, &mut st, &mut wire, vec![]);
        poll(&mut t, &mut st, &mut wire, vec![status(true)]);
        let gh3 = [0x00, 0x00, 0xa4, 0x20, 0x01, 0x03];
        assert_eq!(
            poll(&mut t, &mut st, &mut wire, vec![id_read(gh3)]),
            raw::GUITAR_INSERTED
        );
        st.expansion_buttons = 0x0010;

        assert_eq!(
            poll(&mut t, &mut st, &mut wire, vec![status(false)]),
            raw::STATUS
        );
        assert_eq!(st.expansion, Expansion::None);
        assert_eq!(st.expansion_buttons, 0);
        assert_eq!(poll(&mut t, &mut st, &mut wire, vec![]), raw::GUITAR_REMOVED);
    }

    #[test]
    fn failed_writes_keep_the_remote_and_its_backlog() {
        let mut t = RemoteTracker::new();
        let mut st = SlotState::connected();
        let mut wire = Wire {
            broken: true,
            ..Wire::default()
        };

        assert!(t.apply(status(true), &mut st, &mut wire));
        assert!(st.connected);
        assert_eq!(t.queued(), 2);
        assert_eq!(poll(&mut t, &mut st, &mut wire, vec![]), raw::CONNECT);
        assert_eq!(poll(&mut t, &mut st, &mut wire, vec![]), raw::STATUS);
    }

    #[test]
    fn read_failure_supersedes_the_backlog() {
        let mut t = RemoteTracker::new();
        let mut st = SlotState::connected();
        let mut wire = Wire::default();
        t.apply(status(false), &mut st, &mut wire);

        RemoteTracker::begin_poll(&mut st);
        t.fail(&mut st);
        assert!(!st.connected);
        assert_eq!(st.event, raw::UNEXPECTED_DISCONNECT);
        assert_eq!(t.queued(), 0);
    }

    #[test]
    fn accelerometer_only_counts_with_motion_sensing() {
        let mut t = RemoteTracker::new();
        let mut st = SlotState::connected();
        let mut wire = Wire::default();
        let sample = || InputReport::ButtonsAccel {
            buttons: 0,
            accel: [154, 128, 128],
        };

        assert!(!t.apply(sample(), &mut st, &mut wire));
        assert_eq!(st.orientation.abs_roll, 0.0);

        st.motion_sensing = true;
        assert!(t.apply(sample(), &mut st, &mut wire));
        assert!((st.orientation.abs_roll - 90.0).abs() < 0.01);
    }
}
