use std::time::{SystemTime, UNIX_EPOCH};

/// The [`SystemResource`] trait marks a value that only the surrounding system can produce, such
/// as the current time.
///
/// Runners call [`generate`](SystemResource::generate) and pass the result into a
/// [`StateMachine`](crate::state_machine::StateMachine) as input, keeping the machine itself pure.
pub trait SystemResource {
    /// Produce an instance of this resource from the implicit system context.
    fn generate() -> Self;
}

/// Wall-clock time as milliseconds since the Unix epoch, the unit used by every timestamp on the
/// location feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochMillis(pub u64);

impl EpochMillis {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl SystemResource for EpochMillis {
    fn generate() -> Self {
        // A clock set before 1970 reads as the epoch.
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        Self(millis)
    }
}
