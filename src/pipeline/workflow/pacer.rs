use std::time::Duration;

use tokio::time::Instant;

/// Schedules field operations at least `delay` apart.
///
/// The first operation runs immediately; each later one waits for the slot
/// booked when the previous operation finished.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    next_slot: Option<Instant>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: None,
        }
    }

    /// Wait for the next slot, if one is booked.
    pub async fn ready(&mut self) {
        if let Some(slot) = self.next_slot.take() {
            tokio::time::sleep_until(slot).await;
        }
    }

    /// Book the next slot `delay` after now.
    pub fn completed(&mut self) {
        self.next_slot = Some(Instant::now() + self.delay);
    }
}
