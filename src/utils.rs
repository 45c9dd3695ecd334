/// Utility helpers for storyloop
use rand::seq::SliceRandom;
use std::time::Duration;

/// Suspend the current task without blocking the UI thread.
#[cfg(target_arch = "wasm32")]
pub async fn sleep(duration: Duration) {
    let millis = duration.as_millis().min(u32::MAX as u128) as u32;
    gloo_timers::future::TimeoutFuture::new(millis).await;
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Pick a background track at random. `None` for an empty list.
pub fn pick_background_track(tracks: &[String]) -> Option<&str> {
    tracks
        .choose(&mut rand::thread_rng())
        .map(String::as_str)
}
