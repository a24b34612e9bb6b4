// Usage: cargo run --example logging -- [threads] [messages_per_thread]
//
// RINGWIRE_LOG_LEVEL and RINGWIRE_LOG_TRANSPORT tune the logger. Ctrl+C
// stops the workers early; whatever was queued is still printed.
use std::env;
use std::sync::Arc;
use std::time::Instant;

use ringwire::Logging::{LoggerBuilder, Terminal};
use ringwire::MPMC::StopToken;
use ringwire::{log_debug, log_info, log_warn, Severity};

fn main() -> ringwire::Result<()> {
    let args: Vec<String> = env::args().collect();
    let threads: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(4);
    let per_thread: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);

    let logger = Arc::new(
        LoggerBuilder::from_env()
            .with_sink(Arc::new(Terminal::new(Severity::Trace)))
            .build()?,
    );
    let stop = StopToken::new();
    stop.stop_on_ctrlc()?;

    let main_guard = logger.attach_thread()?;
    logger.rename_current("main")?;
    log_info!(logger, "starting {} workers, {} messages each", threads, per_thread);

    let start = Instant::now();
    let mut handles = Vec::with_capacity(threads);
    for worker in 0..threads {
        let log = Arc::clone(&logger);
        let stop = stop.clone();
        handles.push(logger.spawn_thread(format!("worker-{worker}"), move || {
            let mut sent = 0u64;
            for i in 0..per_thread {
                if stop.is_stopped() {
                    log_warn!(log, "worker {} interrupted after {} messages", worker, i);
                    break;
                }
                log_debug!(log, "worker {} message {} payload {:?}", worker, i, vec![i; 3]);
                sent += 1;
            }
            sent
        })?);
    }

    let mut total = 0;
    for handle in handles {
        total += handle.join().unwrap_or(0);
    }
    log_info!(logger, "{} records from workers in {:?}", total, start.elapsed());
    drop(main_guard);

    let dispatched = logger.shutdown()?;
    println!("Logger dispatched {dispatched} records");
    Ok(())
}
