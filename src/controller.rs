//! Sequences phases, detects completion, handles start/stop, and owns the
//! transient run state.

use heapless::Vec;

use crate::actuator::{clamp_duty, Actuator};
use crate::clock::Clock;
use crate::consts::{IDLE_SNAPSHOT_MS, MAX_PHASES, PID_SAMPLE_MS, PROFILE_SAMPLING_MS};
use crate::envelope::PhaseEnvelope;
use crate::event::{Event, EventSink};
use crate::pid::Pid;
use crate::profile::{validate_profile, Phase, Profile};
use crate::sensor::Sensor;

/// The three states of the phase state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running(usize),
    Completed,
}

/// Owns the active profile's phase list and all transient run state. A
/// single explicit value, not a global singleton — constructed with
/// injected `Clock`/`Sensor`/`Actuator` so tests can substitute fakes.
pub struct Controller<C: Clock, S: Sensor, A: Actuator> {
    clock: C,
    sensor: S,
    actuator: A,
    pid: Pid,

    state: ControllerState,
    active_profile: Option<Vec<Phase, MAX_PHASES>>,
    active_profile_name: Option<heapless::String<19>>,

    envelope: Option<PhaseEnvelope>,
    process_start_ms: u64,

    last_envelope_tick_ms: Option<u64>,
    last_pid_tick_ms: Option<u64>,
    last_idle_snapshot_ms: Option<u64>,

    pid_setpoint: f32,
    pid_input: f32,
    pid_output: f32,
}

impl<C: Clock, S: Sensor, A: Actuator> Controller<C, S, A> {
    pub fn new(clock: C, sensor: S, actuator: A) -> Self {
        Self {
            clock,
            sensor,
            actuator,
            pid: Pid::new(),
            state: ControllerState::Idle,
            active_profile: None,
            active_profile_name: None,
            envelope: None,
            process_start_ms: 0,
            last_envelope_tick_ms: None,
            last_pid_tick_ms: None,
            last_idle_snapshot_ms: None,
            pid_setpoint: 0.0,
            pid_input: 0.0,
            pid_output: 0.0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn running(&self) -> bool {
        matches!(self.state, ControllerState::Running(_))
    }

    pub fn pid_setpoint(&self) -> f32 {
        self.pid_setpoint
    }

    pub fn pid_input(&self) -> f32 {
        self.pid_input
    }

    pub fn pid_output(&self) -> f32 {
        self.pid_output
    }

    /// Timestamp `start()` captured, for display elapsed-time computation.
    /// Meaningless while `!running()`.
    pub fn process_start_ms(&self) -> u64 {
        self.process_start_ms
    }

    /// Timestamp the current phase began, or `None` while idle/completed.
    pub fn phase_start_ms(&self) -> Option<u64> {
        self.envelope.map(|e| e.phase_start_ms())
    }

    /// Name of the phase currently running, or `None` while idle/completed.
    pub fn active_phase_name(&self) -> Option<&str> {
        let ControllerState::Running(index) = self.state else {
            return None;
        };
        self.active_profile
            .as_ref()
            .and_then(|phases| phases.get(index))
            .map(|p| p.name.as_str())
    }

    pub fn active_profile_name(&self) -> Option<&str> {
        self.active_profile_name.as_deref()
    }

    pub fn active_phase_count(&self) -> usize {
        self.active_profile.as_ref().map_or(0, |p| p.len())
    }

    /// Set tunings before `start()`; they are not re-applied mid-run.
    pub fn set_tunings(&mut self, kp: f32, ki: f32, kd: f32) {
        self.pid.set_tunings(kp, ki, kd);
    }

    /// Replace the active profile. `None` behaves like `stop()`.
    pub fn set_active_profile(
        &mut self,
        profile: Option<&Profile>,
        events: &mut impl EventSink,
    ) -> Result<(), crate::error::ReflowError> {
        match profile {
            None => {
                self.active_profile = None;
                self.active_profile_name = None;
                self.stop(events);
                Ok(())
            }
            Some(profile) => {
                validate_profile(profile)?;
                self.active_profile = Some(profile.phases.clone());
                self.active_profile_name = Some(profile.name.clone());
                self.stop(events);
                Ok(())
            }
        }
    }

    /// `Idle -> start() -> Running(0)`, guarded by `active_profile !=
    /// None`. Also allowed from `Completed`, letting a finished profile be
    /// replayed without reselecting it.
    pub fn start(&mut self, events: &mut impl EventSink) -> bool {
        if self.active_profile.is_none() {
            return false;
        }
        if matches!(self.state, ControllerState::Running(_)) {
            return false;
        }

        self.process_start_ms = self.clock.now_ms();
        self.last_pid_tick_ms = None;
        self.last_envelope_tick_ms = None;
        self.start_phase(0, events);
        true
    }

    /// Unconditional transition to `Idle`: zero duty, PID to manual, emit
    /// `oven[on=0]`.
    pub fn stop(&mut self, events: &mut impl EventSink) {
        let was_running = self.running();
        self.state = ControllerState::Idle;
        self.envelope = None;
        self.pid.stop();
        self.actuator.set_duty(0.0);
        if was_running {
            events.emit(Event::Oven { on: false });
        }
    }

    fn start_phase(&mut self, index: usize, events: &mut impl EventSink) {
        let Some(phases) = self.active_profile.as_ref() else {
            self.stop(events);
            return;
        };
        let Some(phase) = phases.get(index).cloned() else {
            self.complete(events);
            return;
        };

        let now = self.clock.now_ms();
        let start_temp = self.sensor.read();
        let envelope = PhaseEnvelope::start(&phase, start_temp, now);

        self.state = ControllerState::Running(index);
        self.pid_setpoint = envelope.start_temp();
        self.pid.start(start_temp);

        if index == 0 {
            events.emit(Event::Oven { on: true });
        }

        events.emit(Event::PhaseStart {
            name: phase.name.clone(),
            end_temp: phase.end_temp,
            configured_slope: phase.slope,
            configured_duration: phase.duration,
        });

        self.envelope = Some(envelope);
    }

    fn complete(&mut self, events: &mut impl EventSink) {
        self.state = ControllerState::Completed;
        self.envelope = None;
        self.pid.stop();
        self.actuator.set_duty(0.0);
        events.emit(Event::Oven { on: false });
    }

    /// Drive the control loop. Internally cadence-gated: envelope every
    /// `PROFILE_SAMPLING_MS`, PID every
    /// `PID_SAMPLE_MS`, idle temperature snapshot every `IDLE_SNAPSHOT_MS`
    /// while not running. Safe (and expected) to call as often as the host
    /// scheduler likes; a call between gate intervals is a no-op.
    pub fn tick(&mut self, events: &mut impl EventSink) {
        let now = self.clock.now_ms();

        if !self.running() {
            self.tick_idle_snapshot(now, events);
            return;
        }

        let due_envelope = due(self.last_envelope_tick_ms, now, PROFILE_SAMPLING_MS);
        if due_envelope {
            self.last_envelope_tick_ms = Some(now);
            self.tick_envelope(now);
            self.tick_terminator(now, events);
        }

        let due_pid = due(self.last_pid_tick_ms, now, PID_SAMPLE_MS);
        if due_pid && self.running() {
            self.last_pid_tick_ms = Some(now);
            self.tick_pid(events);
        }
    }

    fn tick_idle_snapshot(&mut self, now: u64, events: &mut impl EventSink) {
        if due(self.last_idle_snapshot_ms, now, IDLE_SNAPSHOT_MS) {
            self.last_idle_snapshot_ms = Some(now);
            events.emit(Event::IdleSnapshot {
                temperature: self.sensor.read(),
            });
        }
    }

    fn tick_envelope(&mut self, now: u64) {
        if let Some(envelope) = self.envelope.as_mut() {
            self.pid_setpoint = envelope.setpoint_at(now);
        }
    }

    fn tick_terminator(&mut self, now: u64, events: &mut impl EventSink) {
        let ControllerState::Running(index) = self.state else {
            return;
        };
        let Some(envelope) = self.envelope else {
            return;
        };
        if !envelope.is_holding() {
            return;
        }

        let Some(phases) = self.active_profile.as_ref() else {
            return;
        };
        let Some(phase) = phases.get(index) else {
            return;
        };

        let elapsed_s = now.saturating_sub(self.process_phase_start_ms()) as f64 / 1000.0;
        let sensor = self.sensor.read() as f64;
        let ascending = envelope.start_temp() as f64 <= envelope.end_temp() as f64;

        let terminate = if phase.duration > 0 {
            elapsed_s >= phase.duration as f64
        } else if phase.duration == 0 {
            if ascending {
                sensor >= envelope.end_temp() as f64
            } else {
                sensor <= envelope.end_temp() as f64
            }
        } else {
            false
        };

        if terminate {
            let next = index + 1;
            if next < phases.len() {
                self.start_phase(next, events);
            } else {
                self.complete(events);
            }
        }
    }

    fn process_phase_start_ms(&self) -> u64 {
        self.envelope.map_or(self.process_start_ms, |e| e.phase_start_ms())
    }

    fn tick_pid(&mut self, events: &mut impl EventSink) {
        let input = self.sensor.read();
        self.pid_input = input;
        let dt = PID_SAMPLE_MS as f32 / 1000.0;
        let output = self.pid.compute(input, self.pid_setpoint, dt);
        let output = clamp_duty(output);
        self.pid_output = output;
        self.actuator.set_duty(output);

        let slope = self.envelope.map_or(0.0, |e| e.effective_slope());
        let elapsed_ms = self.clock.now_ms().saturating_sub(self.process_start_ms);

        events.emit(Event::PidUpdate {
            process_elapsed_ms: elapsed_ms,
            temperature: input,
            effective_slope: slope,
            setpoint: self.pid_setpoint,
            output,
        });
    }
}

fn due(last: Option<u64>, now: u64, period_ms: u64) -> bool {
    match last {
        None => true,
        Some(last) => now.saturating_sub(last) >= period_ms,
    }
}
