use std::time::Duration;

use crate::Timer;

/// Sleeps until `deadline` on `timer`'s clock.
///
/// The runtime timer only resolves to about a millisecond, so the coarse sleep
/// stops `spin_margin` short of the deadline and the rest is covered by
/// yielding back to the scheduler. Other branches of an enclosing `select!`
/// keep getting polled while this spins.
pub async fn sleep_until_precise<T: Timer>(timer: &T, deadline: T::Timestamp, spin_margin: Duration) {
    let coarse = timer.instant_at(deadline).checked_sub(spin_margin);
    if let Some(coarse) = coarse {
        tokio::time::sleep_until(coarse).await;
    }
    let mut spins: u64 = 0;
    while timer.now() < deadline {
        tokio::task::yield_now().await;
        spins += 1;
    }
    if spins > 0 {
        log::trace!("precise wait finished after {} yields", spins);
    }
}
