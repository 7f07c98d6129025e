#![deny(unsafe_code)]
#![no_std]

pub mod actuator;
pub mod builder;
pub mod catalog;
pub mod clock;
pub mod consts;
pub mod controller;
pub mod digital_input;
pub mod dispatcher;
pub mod display;
pub mod envelope;
pub mod error;
pub mod event;
mod helpers;
pub mod pid;
pub mod policy;
pub mod profile;
pub mod sensor;
pub mod store;

pub use actuator::Actuator;
pub use builder::ControllerBuilder;
pub use catalog::Catalog;
pub use clock::Clock;
pub use controller::{Controller, ControllerState};
pub use digital_input::DigitalInput;
pub use dispatcher::Dispatcher;
pub use display::DisplaySnapshot;
pub use envelope::PhaseEnvelope;
pub use error::ReflowError;
pub use event::{Event, EventSink};
pub use pid::{Pid, PidMode};
pub use policy::{BusyPolicy, RejectWhileRunning};
pub use profile::{validate_profile, Phase, Profile};
pub use sensor::{MovingAverage, Sensor};
pub use store::{record, MemoryStore, Store};

pub mod prelude {
    pub use crate::{
        Actuator, BusyPolicy, Catalog, Clock, Controller, ControllerBuilder, ControllerState,
        DigitalInput, Dispatcher, DisplaySnapshot, Event, EventSink, MemoryStore, Phase,
        PhaseEnvelope, Pid, PidMode, Profile, ReflowError, RejectWhileRunning, Sensor, Store,
        validate_profile,
    };
}
