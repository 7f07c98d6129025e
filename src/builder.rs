//! Typestate builder for `Controller`: each required collaborator
//! (`Clock`, `Sensor`, `Actuator`) must be supplied, in order, before
//! `.build()` is available, so a half-wired controller can't compile.

use core::marker::PhantomData;

use crate::actuator::Actuator;
use crate::clock::Clock;
use crate::controller::Controller;
use crate::sensor::Sensor;

pub struct NeedClock;
pub struct NeedSensor;
pub struct NeedActuator;
pub struct Ready;

pub struct ControllerBuilder<C, S, A, State> {
    clock: Option<C>,
    sensor: Option<S>,
    actuator: Option<A>,
    _state: PhantomData<State>,
}

impl ControllerBuilder<(), (), (), NeedClock> {
    pub fn new() -> Self {
        ControllerBuilder {
            clock: None,
            sensor: None,
            actuator: None,
            _state: PhantomData,
        }
    }
}

impl Default for ControllerBuilder<(), (), (), NeedClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerBuilder<(), (), (), NeedClock> {
    pub fn clock<C: Clock>(self, clock: C) -> ControllerBuilder<C, (), (), NeedSensor> {
        ControllerBuilder {
            clock: Some(clock),
            sensor: None,
            actuator: None,
            _state: PhantomData,
        }
    }
}

impl<C: Clock> ControllerBuilder<C, (), (), NeedSensor> {
    pub fn sensor<S: Sensor>(self, sensor: S) -> ControllerBuilder<C, S, (), NeedActuator> {
        ControllerBuilder {
            clock: self.clock,
            sensor: Some(sensor),
            actuator: None,
            _state: PhantomData,
        }
    }
}

impl<C: Clock, S: Sensor> ControllerBuilder<C, S, (), NeedActuator> {
    pub fn actuator<A: Actuator>(self, actuator: A) -> ControllerBuilder<C, S, A, Ready> {
        ControllerBuilder {
            clock: self.clock,
            sensor: self.sensor,
            actuator: Some(actuator),
            _state: PhantomData,
        }
    }
}

impl<C: Clock, S: Sensor, A: Actuator> ControllerBuilder<C, S, A, Ready> {
    pub fn build(self) -> Controller<C, S, A> {
        Controller::new(
            self.clock.unwrap(),
            self.sensor.unwrap(),
            self.actuator.unwrap(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::FakeClock;

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

    #[test]
    fn builder_wires_all_three_collaborators() {
        let ctrl = ControllerBuilder::new()
            .clock(FakeClock::new())
            .sensor(FixedSensor(25.0))
            .actuator(NullActuator)
            .build();

        assert!(!ctrl.running());
    }
}
