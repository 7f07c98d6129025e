//! In-memory profile/phase representation and validation.

use heapless::{String, Vec};

use crate::consts::{MAX_PHASES, MAX_SLOPE, PHASE_NAME_LEN, RECORD_NAME_LEN};
use crate::error::ReflowError;

/// One segment of a thermal profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub name: String<{ PHASE_NAME_LEN - 1 }>,
    /// Target temperature in °C.
    pub end_temp: f64,
    /// Desired rate of setpoint change in °C/s. Zero requests "hold".
    pub slope: f64,
    /// `> 0`: terminate after exactly this many seconds.
    /// `= 0`: terminate when `end_temp` is reached.
    /// `< 0`: hold indefinitely.
    pub duration: i32,
}

impl Phase {
    pub fn new(name: &str, end_temp: f64, slope: f64, duration: i32) -> Result<Self, ReflowError> {
        let name = String::try_from(name).map_err(|_| ReflowError::NoMemory)?;
        Ok(Self {
            name,
            end_temp,
            slope,
            duration,
        })
    }

    /// A zero-initialized phase, as created by `p nw <name> <n>`.
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            end_temp: 0.0,
            slope: 0.0,
            duration: 0,
        }
    }

    fn validate(&self) -> Result<(), ReflowError> {
        if self.name.is_empty() || !self.name.is_ascii() {
            return Err(ReflowError::InvalidProfile);
        }
        if self.slope.abs() > MAX_SLOPE {
            return Err(ReflowError::InvalidProfile);
        }
        Ok(())
    }
}

/// An ordered sequence of phases plus a name.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String<{ RECORD_NAME_LEN - 1 }>,
    pub phases: Vec<Phase, MAX_PHASES>,
}

impl Profile {
    pub fn new(name: &str) -> Result<Self, ReflowError> {
        let name = String::try_from(name).map_err(|_| ReflowError::NoMemory)?;
        Ok(Self {
            name,
            phases: Vec::new(),
        })
    }

    pub fn push_phase(&mut self, phase: Phase) -> Result<(), ReflowError> {
        self.phases.push(phase).map_err(|_| ReflowError::NoMemory)
    }

    /// Build an `n`-phase draft with blank phases, as `p nw <name> <n>` does.
    pub fn draft(name: &str, n: usize) -> Result<Self, ReflowError> {
        let mut profile = Self::new(name)?;
        for _ in 0..n {
            profile.push_phase(Phase::blank())?;
        }
        Ok(profile)
    }

    pub fn phases_count(&self) -> usize {
        self.phases.len()
    }
}

/// Validate a profile on load or on host submission.
/// Rejects an empty or non-ASCII name, zero phases, any phase with
/// `|slope| > MAX_SLOPE`, or any phase with an empty or non-ASCII name.
/// Returns the first phase unchanged; names are treated as opaque ASCII
/// (no further interpretation).
pub fn validate_profile(profile: &Profile) -> Result<(), ReflowError> {
    if profile.name.is_empty() || !profile.name.is_ascii() {
        return Err(ReflowError::InvalidProfile);
    }
    if profile.phases.is_empty() {
        return Err(ReflowError::InvalidProfile);
    }
    for phase in profile.phases.iter() {
        phase.validate()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(name: &str, end_temp: f64, slope: f64, duration: i32) -> Phase {
        Phase::new(name, end_temp, slope, duration).unwrap()
    }

    #[test]
    fn rejects_empty_profile_name() {
        let mut profile = Profile::new("").unwrap();
        profile.push_phase(phase("R", 100.0, 1.0, 0)).unwrap();
        assert_eq!(validate_profile(&profile), Err(ReflowError::InvalidProfile));
    }

    #[test]
    fn rejects_zero_phases() {
        let profile = Profile::new("Empty").unwrap();
        assert_eq!(validate_profile(&profile), Err(ReflowError::InvalidProfile));
    }

    #[test]
    fn rejects_excessive_slope() {
        let mut profile = Profile::new("Hot").unwrap();
        profile.push_phase(phase("R", 500.0, 150.0, 0)).unwrap();
        assert_eq!(validate_profile(&profile), Err(ReflowError::InvalidProfile));
    }

    #[test]
    fn rejects_phase_with_empty_name() {
        let mut profile = Profile::new("Hot").unwrap();
        profile.push_phase(phase("", 100.0, 1.0, 0)).unwrap();
        assert_eq!(validate_profile(&profile), Err(ReflowError::InvalidProfile));
    }

    #[test]
    fn rejects_phase_with_non_ascii_name() {
        let mut profile = Profile::new("Hot").unwrap();
        profile.push_phase(phase("café", 100.0, 1.0, 0)).unwrap();
        assert_eq!(validate_profile(&profile), Err(ReflowError::InvalidProfile));
    }

    #[test]
    fn rejects_non_ascii_profile_name() {
        let mut profile = Profile::new("café").unwrap();
        profile.push_phase(phase("R", 100.0, 1.0, 0)).unwrap();
        assert_eq!(validate_profile(&profile), Err(ReflowError::InvalidProfile));
    }

    #[test]
    fn accepts_well_formed_profile() {
        let mut profile = Profile::new("Reflow").unwrap();
        profile.push_phase(phase("Soak", 150.0, 1.0, 0)).unwrap();
        profile.push_phase(phase("Peak", 245.0, 0.0, 20)).unwrap();
        assert_eq!(validate_profile(&profile), Ok(()));
    }

    #[test]
    fn draft_creates_n_blank_phases() {
        let profile = Profile::draft("Draft", 3).unwrap();
        assert_eq!(profile.phases_count(), 3);
        assert!(profile.phases.iter().all(|p| p.name.is_empty()));
    }

    #[test]
    fn max_slope_boundary_is_accepted() {
        let mut profile = Profile::new("Edge").unwrap();
        profile.push_phase(phase("R", 200.0, 100.0, 0)).unwrap();
        assert_eq!(validate_profile(&profile), Ok(()));
    }
}
