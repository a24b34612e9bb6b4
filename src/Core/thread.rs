//! Thread identity as seen by the logging lifecycle map.

#[cfg(target_os = "linux")]
pub fn current_thread_id() -> u64 {
    // SYS_gettid cannot fail for the calling thread.
    unsafe { libc::syscall(libc::SYS_gettid) as u64 }
}

#[cfg(not(target_os = "linux"))]
pub fn current_thread_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};

    // Fallback for non-Linux: hand out process-unique ids on first use
    static NEXT: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static ID: u64 = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    ID.with(|id| *id)
}
