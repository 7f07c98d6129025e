//! The ordered, append-only collection of profiles layered on top of a raw
//! `Store`.
//!
//! `Catalog::append` buffers writes and commits them in one pass: a full
//! record (header + phases) is assembled in a local fixed-capacity buffer
//! before a single `Store::write` commits it, rather than writing the
//! header and phases as separate calls that could be torn by a power loss
//! in between.

use heapless::Vec;

use crate::consts::{MAX_RECORD_BYTES, SIG_LEN, STORE_SIGNATURE};
use crate::error::ReflowError;
use crate::policy::{BusyPolicy, RejectWhileRunning};
use crate::profile::{validate_profile, Phase, Profile};
use crate::store::record::{decode_phase, encode_phase, Header, HEADER_LEN, PHASE_LEN};
use crate::store::Store;

/// The append-only profile catalog. Records are variable-length (a header
/// plus however many phases it declares), so there's no O(1) offset to
/// cache without walking the records anyway — `count`, `load_header`, and
/// `find_free_offset` all do a sequential scan from the signature.
pub struct Catalog<S: Store, B: BusyPolicy = RejectWhileRunning> {
    store: S,
    busy_policy: B,
}

impl<S: Store> Catalog<S, RejectWhileRunning> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, RejectWhileRunning)
    }
}

impl<S: Store, B: BusyPolicy> Catalog<S, B> {
    pub fn with_policy(store: S, busy_policy: B) -> Self {
        Self { store, busy_policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True iff the signature bytes equal the expected constant.
    pub fn validate_signature(&self) -> Result<bool, ReflowError> {
        if self.store.len() < SIG_LEN {
            return Ok(false);
        }
        let mut buf = [0u8; SIG_LEN];
        self.store.read(0, &mut buf)?;
        Ok(buf == *STORE_SIGNATURE)
    }

    /// Write the signature and zero-fill the catalog region. Fails with
    /// `ControllerBusy` if `running` and the busy policy rejects mutation
    /// while running, same guard `append` enforces.
    pub fn format(&mut self, running: bool) -> Result<(), ReflowError> {
        if !self.busy_policy.can_mutate(running) {
            return Err(ReflowError::ControllerBusy);
        }

        self.store.write(0, STORE_SIGNATURE)?;

        const CHUNK: usize = 64;
        let zeros = [0u8; CHUNK];
        let mut offset = SIG_LEN;
        while offset < self.store.len() {
            let n = CHUNK.min(self.store.len() - offset);
            self.store.write(offset, &zeros[..n])?;
            offset += n;
        }

        Ok(())
    }

    /// First byte past the last record, or `None` if the catalog is full.
    ///
    /// Bounds the scan at `MAX_PROFILES` iterations: a store whose bytes
    /// never produce an end-of-catalog sentinel (corruption, or a store
    /// genuinely packed beyond this crate's expectations) must not hang the
    /// control loop.
    pub fn find_free_offset(&self) -> Result<Option<usize>, ReflowError> {
        let mut offset = SIG_LEN;
        for _ in 0..crate::consts::MAX_PROFILES + 1 {
            if offset + RECORD_NAME_PROBE > self.store.len() {
                return Ok(None);
            }
            let mut name_probe = [0u8; RECORD_NAME_PROBE];
            self.store.read(offset, &mut name_probe)?;
            if name_probe[0] == 0 {
                return Ok(Some(offset));
            }

            let (_, record_len) = self.read_header_at(offset)?;
            offset += record_len;
        }
        Ok(None)
    }

    /// Number of non-empty records.
    pub fn count(&self) -> Result<usize, ReflowError> {
        let mut n = 0;
        while self.load_header(n)?.is_some() {
            n += 1;
        }
        Ok(n)
    }

    /// Sequentially scan to record `index`; returns its header and byte
    /// offset, or `None` past the end-of-catalog sentinel.
    pub fn load_header(&self, index: usize) -> Result<Option<(Header, usize)>, ReflowError> {
        let mut offset = SIG_LEN;
        for i in 0..=index {
            if offset + RECORD_NAME_PROBE > self.store.len() {
                return Ok(None);
            }
            let mut name_probe = [0u8; RECORD_NAME_PROBE];
            self.store.read(offset, &mut name_probe)?;
            if name_probe[0] == 0 {
                return Ok(None);
            }

            let (header, record_len) = self.read_header_at(offset)?;
            if i == index {
                return Ok(Some((header, offset)));
            }
            offset += record_len;
        }
        Ok(None)
    }

    /// Load the header and every phase of record `index`.
    pub fn load_profile(&self, index: usize) -> Result<Option<Profile>, ReflowError> {
        let Some((header, offset)) = self.load_header(index)? else {
            return Ok(None);
        };

        let mut profile = Profile::new(&header.name)?;
        let mut cursor = offset + HEADER_LEN;
        for _ in 0..header.phases_count.max(0) {
            let mut buf = [0u8; PHASE_LEN];
            self.store.read(cursor, &mut buf)?;
            let phase = decode_phase(&buf)?;
            profile.push_phase(phase)?;
            cursor += PHASE_LEN;
        }

        Ok(Some(profile))
    }

    /// Write header then phases at `find_free_offset()`. Fails with
    /// `ControllerBusy` if `running` and the busy policy rejects mutation
    /// while running, or `CatalogFull`/`NoMemory` if there's no room.
    pub fn append(&mut self, profile: &Profile, running: bool) -> Result<(), ReflowError> {
        if !self.busy_policy.can_mutate(running) {
            return Err(ReflowError::ControllerBusy);
        }
        validate_profile(profile)?;

        let offset = self.find_free_offset()?.ok_or(ReflowError::CatalogFull)?;

        // Stage the full record in one buffer, header first, so the store
        // sees a single contiguous write rather than a header write
        // followed by a separate phases write that a power loss could tear
        // apart: the whole record commits atomically or not at all, from
        // the store's point of view.
        let mut buf: Vec<u8, MAX_RECORD_BYTES> = Vec::new();
        let mut header_bytes = [0u8; HEADER_LEN];
        Header::encode(&profile.name, profile.phases_count() as i16, &mut header_bytes);
        buf.extend_from_slice(&header_bytes)
            .map_err(|_| ReflowError::NoMemory)?;

        for phase in profile.phases.iter() {
            let mut phase_bytes = [0u8; PHASE_LEN];
            encode_phase(phase, &mut phase_bytes);
            buf.extend_from_slice(&phase_bytes)
                .map_err(|_| ReflowError::NoMemory)?;
        }

        if offset + buf.len() > self.store.len() {
            return Err(ReflowError::CatalogFull);
        }

        self.store.write(offset, &buf)?;
        Ok(())
    }

    /// The two-profile default catalog installed on first boot / after
    /// `format()`.
    pub fn register_defaults(&mut self, running: bool) -> Result<(), ReflowError> {
        self.append(&default_oven_controller_profile()?, running)?;
        self.append(&default_pbfree_reflow_profile()?, running)?;
        Ok(())
    }

    /// `spec.md` §8 seed scenario 1 ("Cold boot, blank store"): if the
    /// signature is invalid, format the store and install the default
    /// two-profile catalog. The user-confirmation dialog that gates a
    /// reformat (`spec.md` §7) is the host's "Ask" collaborator, out of
    /// scope here — by the time this is called the host has already
    /// obtained that confirmation. Returns whether a reformat happened; a
    /// store with a valid signature boots unchanged.
    pub fn boot(&mut self, running: bool) -> Result<bool, ReflowError> {
        if self.validate_signature()? {
            return Ok(false);
        }
        self.format(running)?;
        self.register_defaults(running)?;
        Ok(true)
    }

    /// Rescan the catalog, treating a header whose declared `phases_count`
    /// would run past the end of the store as a torn write. Re-marks that
    /// offset as end-of-catalog and returns the number of trailing bytes
    /// discarded.
    pub fn repair(&mut self) -> Result<usize, ReflowError> {
        let mut offset = SIG_LEN;
        loop {
            if offset + RECORD_NAME_PROBE > self.store.len() {
                break;
            }
            let mut name_probe = [0u8; RECORD_NAME_PROBE];
            self.store.read(offset, &mut name_probe)?;
            if name_probe[0] == 0 {
                return Ok(0);
            }

            match self.read_header_at(offset) {
                Ok((_, record_len)) if offset + record_len <= self.store.len() => {
                    offset += record_len;
                }
                _ => {
                    let discarded = self.store.len() - offset;
                    let sentinel = [0u8; RECORD_NAME_PROBE];
                    self.store.write(offset, &sentinel)?;
                    return Ok(discarded);
                }
            }
        }
        Ok(0)
    }

    fn read_header_at(&self, offset: usize) -> Result<(Header, usize), ReflowError> {
        let mut header_bytes = [0u8; HEADER_LEN];
        self.store.read(offset, &mut header_bytes)?;
        let header = Header::decode(&header_bytes)?;
        let phases = header.phases_count.max(0) as usize;
        Ok((header, HEADER_LEN + phases * PHASE_LEN))
    }
}

/// Probe width for the end-of-catalog sentinel check: only `name[0]` needs
/// inspecting, but we read the whole name field up front since
/// `read_header_at` needs it anyway on a non-sentinel record.
const RECORD_NAME_PROBE: usize = crate::consts::RECORD_NAME_LEN;

fn default_oven_controller_profile() -> Result<Profile, ReflowError> {
    let mut profile = Profile::new("Oven Controller")?;
    profile.push_phase(Phase::new("Heating", 50.0, 2.0, 0)?)?;
    profile.push_phase(Phase::new("Hot", 50.0, 0.0, -1)?)?;
    Ok(profile)
}

fn default_pbfree_reflow_profile() -> Result<Profile, ReflowError> {
    let mut profile = Profile::new("PbFree - Reflow")?;
    profile.push_phase(Phase::new("Preheat-1", 50.0, 1.0, 0)?)?;
    profile.push_phase(Phase::new("Preheat-2", 150.0, 1.0, 0)?)?;
    profile.push_phase(Phase::new("Soak-1", 200.0, 0.0, 100)?)?;
    profile.push_phase(Phase::new("Soak-2", 217.0, 0.5, 0)?)?;
    profile.push_phase(Phase::new("Reflow-1", 245.0, 0.0, 20)?)?;
    profile.push_phase(Phase::new("Reflow-2", 217.0, 0.0, 20)?)?;
    profile.push_phase(Phase::new("Cooling", 100.0, -3.0, 0)?)?;
    profile.push_phase(Phase::new("Done", 50.0, -10.0, 0)?)?;
    Ok(profile)
}
