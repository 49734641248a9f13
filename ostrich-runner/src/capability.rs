// Host capability probes, evaluated once per process

use std::sync::OnceLock;
use std::time::Duration;
use tracing::warn;

/// Whether `run` can enforce timeouts on this host.
///
/// Probed on first call by driving a throwaway runtime with the time driver
/// enabled. When this is `false`, a configured timeout is ignored and the
/// child is waited for until it exits.
pub fn timeout_supported() -> bool {
    static SUPPORTED: OnceLock<bool> = OnceLock::new();
    // The probe owns a runtime, so it must not run on an async worker thread.
    *SUPPORTED.get_or_init(|| std::thread::spawn(probe_timer).join().unwrap_or(false))
}

fn probe_timer() -> bool {
    match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime.block_on(async {
            tokio::time::timeout(Duration::ZERO, std::future::pending::<()>())
                .await
                .is_err()
        }),
        Err(e) => {
            warn!(error = %e, "Timer driver unavailable, timeouts will be ignored");
            false
        }
    }
}
