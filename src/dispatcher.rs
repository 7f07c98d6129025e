//! Parses and executes the serial command table against a `Controller` +
//! `Catalog`.

use core::fmt::Write as _;

use heapless::String;

use crate::actuator::Actuator;
use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::controller::Controller;
use crate::digital_input::DigitalInput;
use crate::error::ReflowError;
use crate::event::{Event, EventSink};
use crate::policy::BusyPolicy;
use crate::profile::Profile;
use crate::sensor::Sensor;
use crate::store::Store;

/// Response line capacity; large enough for a 64-byte `e d` hex dump (128
/// hex digits plus the `hex[...]` wrapper), or a `p get` dump of a
/// `MAX_PHASES`-phase profile, whichever is larger.
pub const RESPONSE_CAP: usize = 768;

/// Number of bytes dumped by `e d <off>`.
const DUMP_LEN: usize = 64;

/// Owns the live controller and the catalog it draws profiles from, and
/// maps command strings onto them.
pub struct Dispatcher<C: Clock, S: Sensor, A: Actuator, St: Store, Din: DigitalInput, B: BusyPolicy>
{
    controller: Controller<C, S, A>,
    catalog: Catalog<St, B>,
    digital_input: Din,
    /// Pin currently being watched by `i <pin>`, and the level last
    /// reported, so `poll_digital_input` only emits on a transition.
    watching: Option<(u8, bool)>,
}

impl<C: Clock, S: Sensor, A: Actuator, St: Store, Din: DigitalInput, B: BusyPolicy>
    Dispatcher<C, S, A, St, Din, B>
{
    pub fn new(controller: Controller<C, S, A>, catalog: Catalog<St, B>, digital_input: Din) -> Self {
        Self {
            controller,
            catalog,
            digital_input,
            watching: None,
        }
    }

    pub fn controller(&self) -> &Controller<C, S, A> {
        &self.controller
    }

    pub fn catalog(&self) -> &Catalog<St, B> {
        &self.catalog
    }

    /// Append the controller's current active profile to the catalog.
    /// `p nw` creates a draft active profile but there is no serial
    /// command for saving it; exposed at the library level instead.
    pub fn save_active_profile(&mut self, profile: &Profile) -> Result<(), ReflowError> {
        self.catalog.append(profile, self.controller.running())
    }

    /// Parse and execute one command line, writing the reply into
    /// `response` and returning any error so callers can also map it to a
    /// `CONSOLEERROR` reason code themselves.
    pub fn dispatch(
        &mut self,
        line: &str,
        response: &mut String<RESPONSE_CAP>,
        events: &mut impl EventSink,
    ) -> Result<(), ReflowError> {
        response.clear();
        // Any new command line ends a prior `i <pin>` stream (spec.md §6:
        // "until next input"); `i` itself re-arms a (possibly different)
        // watch below.
        self.watching = None;
        let mut words = line.trim().split_whitespace();
        let Some(cmd) = words.next() else {
            return Err(ReflowError::ArgsCount);
        };

        match cmd {
            "?" => {
                write!(response, "ok[cmds=?,i,p,e,rst]").ok();
                Ok(())
            }
            "i" => {
                let pin: u8 = words
                    .next()
                    .ok_or(ReflowError::ArgsCount)?
                    .parse()
                    .map_err(|_| ReflowError::ArgOutOfRange)?;
                let level = self.digital_input.read(pin);
                self.watching = Some((pin, level));
                write!(response, "ok[i={}]", pin).ok();
                Ok(())
            }
            "p" => self.dispatch_profile(words, response, events),
            "e" => self.dispatch_eeprom(words, response),
            "rst" => {
                self.controller.stop(events);
                write!(response, "ok[rst]").ok();
                Ok(())
            }
            _ => Err(ReflowError::ArgInvalidOpt),
        }
    }

    /// Check the watched pin (armed by `i <pin>`) for a transition and
    /// emit `in[N]=V;` if it moved since the last poll. A no-op when no
    /// pin is being watched. Intended to be called alongside `Controller::
    /// tick` by the host's cooperative scheduling loop — per `spec.md`
    /// §6 the stream runs "until next input" (the next dispatched
    /// command, which re-arms or disarms this), not a blocking read.
    pub fn poll_digital_input(&mut self, events: &mut impl EventSink) {
        let Some((pin, last)) = self.watching else {
            return;
        };
        let level = self.digital_input.read(pin);
        if level != last {
            self.watching = Some((pin, level));
            events.emit(Event::DigitalInputTransition { pin, value: level });
        }
    }

    fn dispatch_profile(
        &mut self,
        mut words: core::str::SplitWhitespace<'_>,
        response: &mut String<RESPONSE_CAP>,
        events: &mut impl EventSink,
    ) -> Result<(), ReflowError> {
        let sub = words.next().ok_or(ReflowError::ArgsCount)?;
        match sub {
            "cur" => {
                let name = self.controller.active_profile_name().unwrap_or("");
                write!(response, "ok[cur={}]", name).ok();
                Ok(())
            }
            "ls" => {
                let count = self.catalog.count()?;
                for idx in 0..count {
                    if idx > 0 {
                        response.push('\n').ok();
                    }
                    let name = self
                        .catalog
                        .load_header(idx)?
                        .map(|(header, _)| header.name)
                        .unwrap_or_default();
                    write!(response, "{}", name).ok();
                }
                Ok(())
            }
            "sel" => {
                let idx: usize = words
                    .next()
                    .ok_or(ReflowError::ArgsCount)?
                    .parse()
                    .map_err(|_| ReflowError::ArgOutOfRange)?;
                let profile = self
                    .catalog
                    .load_profile(idx)?
                    .ok_or(ReflowError::ArgOutOfRange)?;
                self.controller.set_active_profile(Some(&profile), events)?;
                events.emit(Event::ProfileSelected { index: idx });
                write!(response, "ok[sel={}]", idx).ok();
                Ok(())
            }
            "get" => {
                let idx: usize = words
                    .next()
                    .ok_or(ReflowError::ArgsCount)?
                    .parse()
                    .map_err(|_| ReflowError::ArgOutOfRange)?;
                let profile = self
                    .catalog
                    .load_profile(idx)?
                    .ok_or(ReflowError::ArgOutOfRange)?;
                write!(
                    response,
                    "profile[nam={},phases={}]",
                    profile.name,
                    profile.phases_count()
                )
                .ok();
                for phase in profile.phases.iter() {
                    write!(
                        response,
                        "\nphase[nam={},end={},m={},t={}]",
                        phase.name, phase.end_temp, phase.slope, phase.duration
                    )
                    .ok();
                }
                Ok(())
            }
            "nw" => {
                let name = words.next().ok_or(ReflowError::ArgsCount)?;
                let n: usize = words
                    .next()
                    .ok_or(ReflowError::ArgsCount)?
                    .parse()
                    .map_err(|_| ReflowError::ArgOutOfRange)?;
                let draft = Profile::draft(name, n)?;
                self.controller.set_active_profile(Some(&draft), events)?;
                write!(response, "ok[nw={}]", name).ok();
                Ok(())
            }
            "on" => {
                if !self.controller.start(events) {
                    return Err(ReflowError::NoActiveProfile);
                }
                write!(response, "ok[on]").ok();
                Ok(())
            }
            "off" => {
                self.controller.stop(events);
                write!(response, "ok[off]").ok();
                Ok(())
            }
            _ => Err(ReflowError::ArgInvalidOpt),
        }
    }

    fn dispatch_eeprom(
        &mut self,
        mut words: core::str::SplitWhitespace<'_>,
        response: &mut String<RESPONSE_CAP>,
    ) -> Result<(), ReflowError> {
        let sub = words.next().ok_or(ReflowError::ArgsCount)?;
        match sub {
            "inf" => {
                let signature_ok = self.catalog.validate_signature()?;
                let record_count = if signature_ok { self.catalog.count()? } else { 0 };
                let free_start = self.catalog.find_free_offset()?.unwrap_or(0);
                write!(
                    response,
                    "eeprom[sigOk={},len={},freestart={}]",
                    signature_ok as u8, record_count, free_start
                )
                .ok();
                Ok(())
            }
            "fmt" => {
                let running = self.controller.running();
                self.catalog.format(running)?;
                self.catalog.register_defaults(running)?;
                write!(response, "ok[fmt]").ok();
                Ok(())
            }
            "d" => {
                let offset: usize = words
                    .next()
                    .ok_or(ReflowError::ArgsCount)?
                    .parse()
                    .map_err(|_| ReflowError::ArgOutOfRange)?;

                let n = DUMP_LEN.min(self.catalog.store().len().saturating_sub(offset));
                if n == 0 {
                    return Err(ReflowError::ArgOutOfRange);
                }
                let mut buf = [0u8; DUMP_LEN];
                self.catalog.store().read(offset, &mut buf[..n])?;

                write!(response, "hex[").ok();
                for byte in &buf[..n] {
                    write!(response, "{:02x}", byte).ok();
                }
                write!(response, "]").ok();
                Ok(())
            }
            _ => Err(ReflowError::ArgInvalidOpt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ControllerBuilder;
    use crate::clock::test_support::FakeClock;
    use crate::digital_input::test_support::FakePin;
    use crate::event::test_support::RecordingSink;
    use crate::policy::RejectWhileRunning;
    use crate::store::MemoryStore;

    struct FixedSensor(f32);
    impl Sensor for FixedSensor {
        fn read(&self) -> f32 {
            self.0
        }
    }

    #[derive(Default)]
    struct NullActuator;
    impl Actuator for NullActuator {
        fn set_duty(&mut self, _duty: f32) {}
    }

    fn fresh_dispatcher() -> Dispatcher<FakeClock, FixedSensor, NullActuator, MemoryStore<4096>, FakePin, RejectWhileRunning>
    {
        let controller = ControllerBuilder::new()
            .clock(FakeClock::new())
            .sensor(FixedSensor(25.0))
            .actuator(NullActuator)
            .build();
        let mut catalog = Catalog::new(MemoryStore::new());
        catalog.format(false).unwrap();
        catalog.register_defaults(false).unwrap();
        Dispatcher::new(controller, catalog, FakePin::new(false))
    }

    #[test]
    fn profile_ls_lists_default_catalog_names_one_per_line() {
        let mut dispatcher = fresh_dispatcher();
        let mut response = String::new();
        let mut sink = RecordingSink::new();
        dispatcher.dispatch("p ls", &mut response, &mut sink).unwrap();
        assert_eq!(response.as_str(), "Oven Controller\nPbFree - Reflow");
    }

    #[test]
    fn eeprom_d_dumps_the_signature_as_hex() {
        let mut dispatcher = fresh_dispatcher();
        let mut response = String::new();
        let mut sink = RecordingSink::new();
        dispatcher.dispatch("e d 0", &mut response, &mut sink).unwrap();
        assert!(response.starts_with("hex["));
        // "VLReflow\0" -> 56 4c 52 65 66 6c 6f 77 00
        assert!(response.contains("564c5265666c6f7700"));
    }

    #[test]
    fn eeprom_d_past_end_of_store_is_out_of_range() {
        let mut dispatcher = fresh_dispatcher();
        let mut response = String::new();
        let mut sink = RecordingSink::new();
        assert_eq!(
            dispatcher.dispatch("e d 999999", &mut response, &mut sink),
            Err(ReflowError::ArgOutOfRange)
        );
    }

    #[test]
    fn profile_get_dumps_the_header_and_every_phase() {
        let mut dispatcher = fresh_dispatcher();
        let mut response = String::new();
        let mut sink = RecordingSink::new();
        dispatcher.dispatch("p get 0", &mut response, &mut sink).unwrap();
        assert!(response.starts_with("profile[nam=Oven Controller,phases=2]"));
        assert!(response.contains("\nphase[nam=Heating,end=50,m=2,t=0]"));
        assert!(response.contains("\nphase[nam=Hot,end=50,m=0,t=-1]"));
    }

    #[test]
    fn profile_sel_then_on_starts_the_controller() {
        let mut dispatcher = fresh_dispatcher();
        let mut response = String::new();
        let mut sink = RecordingSink::new();

        dispatcher.dispatch("p sel 1", &mut response, &mut sink).unwrap();
        assert_eq!(response.as_str(), "ok[sel=1]");

        dispatcher.dispatch("p on", &mut response, &mut sink).unwrap();
        assert_eq!(response.as_str(), "ok[on]");
        assert!(dispatcher.controller.running());
    }

    #[test]
    fn profile_on_without_selection_is_rejected() {
        let mut dispatcher = fresh_dispatcher();
        let mut response = String::new();
        let mut sink = RecordingSink::new();
        assert_eq!(
            dispatcher.dispatch("p on", &mut response, &mut sink),
            Err(ReflowError::NoActiveProfile)
        );
    }

    #[test]
    fn eeprom_fmt_while_running_is_rejected() {
        let mut dispatcher = fresh_dispatcher();
        let mut response = String::new();
        let mut sink = RecordingSink::new();
        dispatcher.dispatch("p sel 0", &mut response, &mut sink).unwrap();
        dispatcher.dispatch("p on", &mut response, &mut sink).unwrap();

        assert_eq!(
            dispatcher.dispatch("e fmt", &mut response, &mut sink),
            Err(ReflowError::ControllerBusy)
        );
    }

    #[test]
    fn unknown_command_is_arg_invalid_opt() {
        let mut dispatcher = fresh_dispatcher();
        let mut response = String::new();
        let mut sink = RecordingSink::new();
        assert_eq!(
            dispatcher.dispatch("zzz", &mut response, &mut sink),
            Err(ReflowError::ArgInvalidOpt)
        );
    }

    #[test]
    fn i_command_arms_watch_and_reports_transitions_on_poll() {
        let controller = ControllerBuilder::new()
            .clock(FakeClock::new())
            .sensor(FixedSensor(25.0))
            .actuator(NullActuator)
            .build();
        let mut catalog = Catalog::new(MemoryStore::new());
        catalog.format(false).unwrap();
        let pin = FakePin::new(false);
        let mut dispatcher = Dispatcher::new(controller, catalog, pin);

        let mut response = String::new();
        let mut sink = RecordingSink::new();
        dispatcher.dispatch("i 3", &mut response, &mut sink).unwrap();
        assert_eq!(response.as_str(), "ok[i=3]");

        dispatcher.poll_digital_input(&mut sink);
        assert!(sink.events().is_empty());

        dispatcher.digital_input.set(true);
        dispatcher.poll_digital_input(&mut sink);
        assert_eq!(
            sink.events().last(),
            Some(&Event::DigitalInputTransition { pin: 3, value: true })
        );
    }

    #[test]
    fn a_new_command_ends_the_digital_input_stream() {
        let mut dispatcher = fresh_dispatcher();
        let mut response = String::new();
        let mut sink = RecordingSink::new();
        dispatcher.dispatch("i 3", &mut response, &mut sink).unwrap();
        dispatcher.dispatch("p ls", &mut response, &mut sink).unwrap();

        dispatcher.digital_input.set(true);
        dispatcher.poll_digital_input(&mut sink);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn save_active_profile_appends_the_draft() {
        let mut dispatcher = fresh_dispatcher();
        let mut response = String::new();
        let mut sink = RecordingSink::new();
        dispatcher
            .dispatch("p nw Draft 2", &mut response, &mut sink)
            .unwrap();

        let draft = Profile::draft("Draft", 2).unwrap();
        dispatcher.save_active_profile(&draft).unwrap();
        assert_eq!(dispatcher.catalog.count().unwrap(), 3);
    }
}
