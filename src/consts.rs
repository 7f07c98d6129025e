//! Crate-wide tunables. Expressed as plain `const`s next to where they're
//! used conceptually but collected here since several modules share them.

/// A phase is valid only if `|slope| <= MAX_SLOPE`.
pub const MAX_SLOPE: f64 = 100.0;

/// Fixed inline phase buffer capacity per active profile.
pub const MAX_PHASES: usize = 16;

/// Bounds the defensive scan loop in `Catalog::find_free_offset` — a
/// corruption guard, not a limit on how many profiles the store can
/// actually hold.
pub const MAX_PROFILES: usize = 64;

/// Envelope generator tick period.
pub const PROFILE_SAMPLING_MS: u64 = 50;

/// PID sample period.
pub const PID_SAMPLE_MS: u64 = 250;

/// Idle temperature snapshot cadence.
pub const IDLE_SNAPSHOT_MS: u64 = 500;

/// Actuator PWM period (informational; the actuator itself owns this, the
/// core only ever calls `set_duty`).
pub const ACTUATOR_PERIOD_MS: u64 = 250;

/// Default PID gains.
pub const DEFAULT_KP: f32 = 300.0;
pub const DEFAULT_KI: f32 = 0.05;
pub const DEFAULT_KD: f32 = 250.0;

/// On-disk signature, NUL-terminated.
pub const STORE_SIGNATURE: &[u8] = b"VLReflow\0";
pub const SIG_LEN: usize = STORE_SIGNATURE.len();

/// On-disk field widths (bit-exact contract).
pub const RECORD_NAME_LEN: usize = 20;
pub const PHASE_NAME_LEN: usize = 11;

/// Maximum encoded size of one record (header + `MAX_PHASES` phases),
/// used to size the staged write buffer in `Catalog::append`.
pub const MAX_RECORD_BYTES: usize =
    RECORD_NAME_LEN + 2 + MAX_PHASES * (PHASE_NAME_LEN + 8 + 8 + 4);
