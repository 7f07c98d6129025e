//! The device's asynchronous structured output: `oven[...]`, `phase[...]`,
//! `pid[...]`, `profile[...]` lines emitted on state transitions.
//! `eeprom[...]` is a direct command response (`Dispatcher::dispatch`'s
//! `e inf`), not an emitted `Event` — nothing transitions asynchronously
//! to report.

use core::fmt::Write as _;

use heapless::String;

/// One line of structured output.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `oven[on=0|1]`
    Oven { on: bool },
    /// `phase[nam=...,end=...,m=...,t=...]`
    PhaseStart {
        name: heapless::String<10>,
        end_temp: f64,
        configured_slope: f64,
        configured_duration: i32,
    },
    /// `pid[pdt=...,tmp=...,slp=...,spt=...,out=...]`
    PidUpdate {
        process_elapsed_ms: u64,
        temperature: f32,
        effective_slope: f32,
        setpoint: f32,
        output: f32,
    },
    /// `profile[idx=...]`
    ProfileSelected { index: usize },
    /// Not part of the device's documented wire table; an idle-cadence
    /// temperature snapshot surfaced the same way so a host can chart it
    /// without polling a separate accessor.
    IdleSnapshot { temperature: f32 },
    /// `in[N]=V;` — one per observed transition while `i <pin>` is armed.
    DigitalInputTransition { pin: u8, value: bool },
}

/// Maximum formatted line length, generous enough for `phase[...]`'s
/// 10-byte name plus four numeric fields without truncation in any
/// realistic range.
pub const EVENT_LINE_CAP: usize = 96;

impl Event {
    /// Render this event into the device's wire format, one line, no
    /// trailing newline (the serial framing layer owns line termination).
    pub fn format_into(&self, out: &mut String<EVENT_LINE_CAP>) -> core::fmt::Result {
        out.clear();
        match self {
            Event::Oven { on } => write!(out, "oven[on={}]", *on as u8),
            Event::PhaseStart {
                name,
                end_temp,
                configured_slope,
                configured_duration,
            } => write!(
                out,
                "phase[nam={},end={},m={},t={}]",
                name, end_temp, configured_slope, configured_duration
            ),
            Event::PidUpdate {
                process_elapsed_ms,
                temperature,
                effective_slope,
                setpoint,
                output,
            } => write!(
                out,
                "pid[pdt={},tmp={},slp={},spt={},out={}]",
                process_elapsed_ms, temperature, effective_slope, setpoint, output
            ),
            Event::ProfileSelected { index } => write!(out, "profile[idx={}]", index),
            Event::IdleSnapshot { temperature } => write!(out, "tmp[val={}]", temperature),
            Event::DigitalInputTransition { pin, value } => {
                write!(out, "in[{}]={};", pin, *value as u8)
            }
        }
    }
}

/// Destination for emitted events. A host implementation writes the
/// formatted line to the serial port; tests record them in memory.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oven_on_formats_as_one() {
        let mut buf = String::new();
        Event::Oven { on: true }.format_into(&mut buf).unwrap();
        assert_eq!(buf.as_str(), "oven[on=1]");
    }

    #[test]
    fn oven_off_formats_as_zero() {
        let mut buf = String::new();
        Event::Oven { on: false }.format_into(&mut buf).unwrap();
        assert_eq!(buf.as_str(), "oven[on=0]");
    }

    #[test]
    fn phase_start_includes_all_fields() {
        let mut buf = String::new();
        Event::PhaseStart {
            name: heapless::String::try_from("Soak").unwrap(),
            end_temp: 150.0,
            configured_slope: 1.0,
            configured_duration: 0,
        }
        .format_into(&mut buf)
        .unwrap();
        assert!(buf.starts_with("phase[nam=Soak,"));
    }

    #[test]
    fn digital_input_transition_formats_with_trailing_semicolon() {
        let mut buf = String::new();
        Event::DigitalInputTransition { pin: 3, value: true }
            .format_into(&mut buf)
            .unwrap();
        assert_eq!(buf.as_str(), "in[3]=1;");
    }

    #[test]
    fn recording_sink_counts_pid_updates() {
        use test_support::RecordingSink;
        let mut sink = RecordingSink::new();
        sink.emit(Event::Oven { on: true });
        sink.emit(Event::PidUpdate {
            process_elapsed_ms: 0,
            temperature: 25.0,
            effective_slope: 1.0,
            setpoint: 25.0,
            output: 0.0,
        });
        assert_eq!(sink.pid_update_count(), 1);
        assert_eq!(sink.last_oven(), Some(true));
    }
}
