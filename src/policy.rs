//! Gates catalog mutation while the controller is running: the store is
//! mutated only by catalog commands while the controller is not running,
//! enforced by rejecting writes with a "controller busy" error rather than
//! by locking.

/// Decides whether a catalog mutation (`format`/`append`) may proceed given
/// the controller's current `running` flag.
pub trait BusyPolicy {
    fn can_mutate(&self, running: bool) -> bool;
}

/// Catalog mutation is rejected outright while the controller is running.
#[derive(Default, Clone, Copy)]
pub struct RejectWhileRunning;

impl BusyPolicy for RejectWhileRunning {
    fn can_mutate(&self, running: bool) -> bool {
        !running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_while_running() {
        assert!(!RejectWhileRunning.can_mutate(true));
    }

    #[test]
    fn allows_while_idle() {
        assert!(RejectWhileRunning.can_mutate(false));
    }
}
