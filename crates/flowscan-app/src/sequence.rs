use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic scan request counter.
///
/// Every scan takes a ticket; a caller holding several in-flight results keeps
/// only the one whose ticket is still current.
#[derive(Debug, Default)]
pub struct ScanSequence {
    last: AtomicU64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanTicket(u64);

impl ScanTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl ScanSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next ticket. The first ticket is 1.
    pub fn next_ticket(&self) -> ScanTicket {
        ScanTicket(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: ScanTicket) -> bool {
        self.last.load(Ordering::SeqCst) == ticket.0
    }

    pub fn latest(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_ticket_supersedes_earlier() {
        let seq = ScanSequence::new();
        assert_eq!(seq.latest(), 0);
        let first = seq.next_ticket();
        assert_eq!(first.value(), 1);
        assert!(seq.is_current(first));

        let second = seq.next_ticket();
        assert!(second > first);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }
}
