//! On-disk record layout (`spec.md` §4.4): hand-rolled, byte-exact
//! encode/decode. No `serde` — the field widths are a cross-compatibility
//! contract with an existing store layout, not something a serializer's
//! default representation could be trusted to preserve.

use heapless::String;

use crate::consts::{PHASE_NAME_LEN, RECORD_NAME_LEN};
use crate::error::ReflowError;
use crate::profile::Phase;

/// `name[20] || phases_count: i16`, 22 bytes.
pub const HEADER_LEN: usize = RECORD_NAME_LEN + 2;
/// `name[11] || end_temp: f64 || slope: f64 || duration: i32`, 31 bytes.
pub const PHASE_LEN: usize = PHASE_NAME_LEN + 8 + 8 + 4;

/// A decoded catalog record header: profile name and phase count.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub name: String<{ RECORD_NAME_LEN - 1 }>,
    pub phases_count: i16,
}

impl Header {
    /// A record whose `name[0] == 0` marks end-of-catalog.
    pub fn is_end_sentinel(bytes: &[u8; RECORD_NAME_LEN]) -> bool {
        bytes[0] == 0
    }

    pub fn encode(name: &str, phases_count: i16, out: &mut [u8; HEADER_LEN]) {
        encode_name::<RECORD_NAME_LEN>(name, (&mut out[..RECORD_NAME_LEN]).try_into().unwrap());
        out[RECORD_NAME_LEN..HEADER_LEN].copy_from_slice(&phases_count.to_le_bytes());
    }

    pub fn decode(bytes: &[u8; HEADER_LEN]) -> Result<Self, ReflowError> {
        let name_bytes: [u8; RECORD_NAME_LEN] = bytes[..RECORD_NAME_LEN].try_into().unwrap();
        let name = decode_name(&name_bytes)?;
        let phases_count =
            i16::from_le_bytes(bytes[RECORD_NAME_LEN..HEADER_LEN].try_into().unwrap());
        Ok(Self { name, phases_count })
    }
}

pub fn encode_phase(phase: &Phase, out: &mut [u8; PHASE_LEN]) {
    encode_name::<PHASE_NAME_LEN>(
        &phase.name,
        (&mut out[..PHASE_NAME_LEN]).try_into().unwrap(),
    );
    let mut o = PHASE_NAME_LEN;
    out[o..o + 8].copy_from_slice(&phase.end_temp.to_le_bytes());
    o += 8;
    out[o..o + 8].copy_from_slice(&phase.slope.to_le_bytes());
    o += 8;
    out[o..o + 4].copy_from_slice(&phase.duration.to_le_bytes());
}

pub fn decode_phase(bytes: &[u8; PHASE_LEN]) -> Result<Phase, ReflowError> {
    let name_bytes: [u8; PHASE_NAME_LEN] = bytes[..PHASE_NAME_LEN].try_into().unwrap();
    let name = decode_name(&name_bytes)?;

    let mut o = PHASE_NAME_LEN;
    let end_temp = f64::from_le_bytes(bytes[o..o + 8].try_into().unwrap());
    o += 8;
    let slope = f64::from_le_bytes(bytes[o..o + 8].try_into().unwrap());
    o += 8;
    let duration = i32::from_le_bytes(bytes[o..o + 4].try_into().unwrap());

    Ok(Phase {
        name,
        end_temp,
        slope,
        duration,
    })
}

fn encode_name<const FIELD_LEN: usize>(name: &str, out: &mut [u8; FIELD_LEN]) {
    out.fill(0);
    let bytes = name.as_bytes();
    let n = bytes.len().min(FIELD_LEN - 1);
    out[..n].copy_from_slice(&bytes[..n]);
}

/// Decode a NUL-terminated ASCII field. `spec.md` §4.5 rejects any phase
/// name that is not NUL-terminated within its field.
fn decode_name<const FIELD_LEN: usize, const CAP: usize>(
    bytes: &[u8; FIELD_LEN],
) -> Result<String<CAP>, ReflowError> {
    let end = bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or(ReflowError::InvalidProfile)?;
    let s = core::str::from_utf8(&bytes[..end]).map_err(|_| ReflowError::InvalidProfile)?;
    String::try_from(s).map_err(|_| ReflowError::InvalidProfile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let mut buf = [0u8; HEADER_LEN];
        Header::encode("PbFree - Reflow", 8, &mut buf);
        let decoded = Header::decode(&buf).unwrap();
        assert_eq!(decoded.name.as_str(), "PbFree - Reflow");
        assert_eq!(decoded.phases_count, 8);
    }

    #[test]
    fn header_end_sentinel_detected() {
        let buf = [0u8; RECORD_NAME_LEN];
        assert!(Header::is_end_sentinel(&buf));
        let mut nonempty = buf;
        nonempty[0] = b'X';
        assert!(!Header::is_end_sentinel(&nonempty));
    }

    #[test]
    fn phase_round_trips() {
        let phase = Phase::new("Soak", 200.0, 0.0, 100).unwrap();
        let mut buf = [0u8; PHASE_LEN];
        encode_phase(&phase, &mut buf);
        let decoded = decode_phase(&buf).unwrap();
        assert_eq!(decoded, phase);
    }

    #[test]
    fn phase_negative_slope_and_duration_round_trip() {
        let phase = Phase::new("Cool", 50.0, -10.0, -1).unwrap();
        let mut buf = [0u8; PHASE_LEN];
        encode_phase(&phase, &mut buf);
        let decoded = decode_phase(&buf).unwrap();
        assert_eq!(decoded, phase);
    }

    #[test]
    fn decode_rejects_name_missing_nul_terminator() {
        let buf = [b'X'; RECORD_NAME_LEN]; // no NUL anywhere in the field
        assert_eq!(Header::decode(&buf), Err(ReflowError::InvalidProfile));
    }

    #[test]
    fn encode_truncates_overlong_name_but_still_nul_terminates() {
        let long = "this name is far too long for the field";
        let mut buf = [0u8; RECORD_NAME_LEN];
        encode_name::<RECORD_NAME_LEN>(long, &mut buf);
        assert!(buf.contains(&0));
    }
}
