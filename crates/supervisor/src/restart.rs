//! Process-level restart policy
//!
//! The connection loop never gives up on its own; this wrapper covers the
//! cases it cannot: a panic, or a failure while building the pipeline.

use std::any::Any;
use std::future::Future;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::RestartPolicy;
use crate::shutdown::{is_shutdown, sleep_or_shutdown};

/// Run `factory()` on its own task, rebuilding it after every crash
///
/// Returns when one generation finishes with `Ok`, or when shutdown is
/// requested while waiting to restart.
pub async fn run_with_restart<F, Fut>(
    mut factory: F,
    policy: RestartPolicy,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let mut generation: u64 = 0;

    loop {
        if is_shutdown(&shutdown) {
            return Ok(());
        }
        generation += 1;

        let cause = match tokio::spawn(factory()).await {
            Ok(Ok(())) => {
                info!(generation, "Supervisor exited");
                return Ok(());
            }
            Ok(Err(e)) => {
                error!(generation, error = ?e, "Supervisor failed");
                "error"
            }
            Err(e) if e.is_panic() => {
                error!(
                    generation,
                    panic = panic_message(e.into_panic().as_ref()),
                    "Supervisor panicked"
                );
                "panic"
            }
            Err(e) => {
                error!(generation, error = %e, "Supervisor task cancelled");
                "cancelled"
            }
        };

        observability::record_restart(cause);
        warn!(
            generation,
            delay_secs = policy.delay.as_secs_f64(),
            "Restarting supervisor after delay"
        );
        if !sleep_or_shutdown(policy.delay, &mut shutdown).await {
            return Ok(());
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    const DELAY: Duration = Duration::from_secs(60);

    fn policy() -> RestartPolicy {
        RestartPolicy { delay: DELAY }
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_panic() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let (_tx, rx) = watch::channel(false);
        let started = Instant::now();

        let result = run_with_restart(
            move || {
                let generation = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if generation == 0 {
                        panic!("first generation crashes");
                    }
                    anyhow::Ok(())
                }
            },
            policy(),
            rx,
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_build_error() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let (_tx, rx) = watch::channel(false);
        let started = Instant::now();

        run_with_restart(
            move || {
                let generation = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if generation < 2 {
                        anyhow::bail!("sink unavailable");
                    }
                    Ok(())
                }
            },
            policy(),
            rx,
        )
        .await
        .unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_restart_delay() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let (tx, rx) = watch::channel(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            tx.send(true).unwrap();
        });

        let started = Instant::now();
        run_with_restart(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(anyhow::anyhow!("always broken")) }
            },
            policy(),
            rx,
        )
        .await
        .unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < DELAY);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "<non-string panic>");
    }
}
