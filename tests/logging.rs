use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use ringwire::Core::clock::now_ns;
use ringwire::Core::thread::current_thread_id;
use ringwire::Core::Encode;
use ringwire::Logging::format::{formatter_for, CallSite};
use ringwire::Logging::logger::Transport;
use ringwire::Logging::service::{Exit, Rename, SetParent, Spawn, PRINT};
use ringwire::Logging::{
    CachedThreadInfo, Location, LogFrame, Logger, LoggingEvent, LoggingService, Message, Severity,
    Sink, SinkSet, Terminal,
};
use ringwire::MPMC::EventQueue;
use ringwire::RPC::protocol;
use ringwire::{log_at, log_debug, log_error, log_info, log_trace};

/// Records everything it is handed, as text.
#[derive(Default)]
struct Capture {
    lines: Mutex<Vec<String>>,
    messages: Mutex<Vec<Message>>,
}

impl Capture {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    fn texts(&self) -> Vec<String> {
        self.messages.lock().iter().map(|m| m.text.clone()).collect()
    }
}

impl Sink for Capture {
    fn print(&self, message: &Message) {
        self.lines.lock().push(format!("print {}", message.text));
        self.messages.lock().push(message.clone());
    }

    fn spawn(&self, _timestamp: u64, thread: &CachedThreadInfo) {
        self.lines.lock().push(format!("spawn {}", thread.id));
    }

    fn exit(&self, _timestamp: u64, thread: &CachedThreadInfo) {
        self.lines.lock().push(format!("exit {} {}", thread.id, thread.name));
    }

    fn rename(&self, _timestamp: u64, thread: &CachedThreadInfo, name: &str) {
        self.lines
            .lock()
            .push(format!("rename {} {} -> {}", thread.id, thread.name, name));
    }

    fn set_parent(&self, _timestamp: u64, thread: &CachedThreadInfo, parent: &CachedThreadInfo) {
        self.lines
            .lock()
            .push(format!("parent {} <- {}", thread.id, parent.id));
    }
}

struct FooBar;

impl CallSite for FooBar {
    const TEMPLATE: &'static str = "foo {} bar {}";
    const LOCATION: Location = Location {
        file: "tests/logging.rs",
        module: "logging",
        line: 1,
        column: 1,
    };
}

fn service_with_capture() -> (LoggingService, Arc<Capture>) {
    let capture = Arc::new(Capture::default());
    let sinks = Arc::new(SinkSet::new());
    sinks.add(capture.clone());
    (LoggingService::new(sinks), capture)
}

#[test]
fn lifecycle_over_event_queue() {
    let queue = EventQueue::<LogFrame, 64>::new();
    let client = queue.make_client();
    client.notify::<Spawn>((1, 7)).unwrap();
    client.notify::<Rename>((2, 7, "worker".to_owned())).unwrap();
    client.notify::<SetParent>((3, 7, 1)).unwrap();
    client.notify::<Exit>((4, 7)).unwrap();
    client.kill().unwrap();

    let (mut service, capture) = service_with_capture();
    assert_eq!(queue.make_server().run(&mut service).unwrap(), 4);
    assert_eq!(
        capture.lines(),
        [
            "spawn 7",
            "rename 7 <unnamed> -> worker",
            "parent 7 <- 1",
            "exit 7 worker",
        ]
    );
    // The parent entry created by set_parent is still tracked.
    assert_eq!(service.thread_count(), 1);
    assert!(service.thread(7).is_none());
}

#[test]
fn deferred_formatting_over_event_queue() {
    let queue = EventQueue::<LogFrame, 64>::new();
    let client = queue.make_client();
    let args = (&420i32, &420i32);
    let record: LogFrame = protocol::build(PRINT, |out: &mut LogFrame| {
        LoggingEvent {
            severity: Severity::Info,
            thread: 7,
            timestamp: now_ns(),
            formatter: formatter_for::<FooBar, _>(&args),
        }
        .encode(out)?;
        args.encode(out)
    })
    .unwrap();
    client.notify::<Spawn>((0, 7)).unwrap();
    client.notify::<Rename>((0, 7, "worker".to_owned())).unwrap();
    client.send(record).unwrap();
    client.kill().unwrap();

    let (mut service, capture) = service_with_capture();
    queue.make_server().run(&mut service).unwrap();

    let messages = capture.messages.lock();
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert_eq!(message.text, "foo 420 bar 420");
    assert_eq!(message.severity, Severity::Info);
    assert_eq!(message.thread.name, "worker");
    assert_eq!(message.location.file, "tests/logging.rs");
}

#[test]
fn logger_end_to_end() {
    let capture = Arc::new(Capture::default());
    let logger = Logger::builder()
        .with_minimum_severity(Severity::Debug)
        .with_sink(capture.clone())
        .build()
        .unwrap();

    let guard = logger.attach_thread().unwrap();
    logger.rename_current("main").unwrap();
    log_trace!(logger, "dropped {}", 1);
    log_debug!(logger, "list {:?}", vec![1u8, 2]);
    log_info!(logger, "name {} id {}", "alpha", 7u64);
    log_error!(logger, "no args");
    drop(guard);

    let dispatched = logger.shutdown().unwrap();
    assert_eq!(dispatched, 6);
    assert_eq!(logger.shutdown().unwrap(), 0);

    assert_eq!(
        capture.texts(),
        ["list [1, 2]", "name alpha id 7", "no args"]
    );
    let messages = capture.messages.lock();
    assert!(messages.iter().all(|m| m.thread.name == "main"));
    assert!(messages.iter().all(|m| m.thread.id == current_thread_id()));
    assert_eq!(messages[2].severity, Severity::Error);
    assert!(capture.lines().last().unwrap().starts_with("exit "));
}

struct Padded;

impl CallSite for Padded {
    const TEMPLATE: &'static str = "width {:>5}";
    const LOCATION: Location = Location {
        file: "tests/logging.rs",
        module: "logging",
        line: 2,
        column: 1,
    };
}

#[test]
fn unprintable_record_does_not_stop_the_consumer() {
    let capture = Arc::new(Capture::default());
    let logger = Logger::builder().with_sink(capture.clone()).build().unwrap();

    let args = (&7i32,);
    logger.emit(Severity::Info, formatter_for::<Padded, _>(&args), &args);
    // Well past the ring capacity, so a dead consumer would block here.
    for i in 0..200u32 {
        log_info!(logger, "after {}", i);
    }

    assert_eq!(logger.shutdown().unwrap(), 201);
    let texts = capture.texts();
    assert_eq!(texts.len(), 200);
    assert_eq!(texts[0], "after 0");
    assert_eq!(texts[199], "after 199");
}

#[test]
fn records_after_shutdown_are_not_delivered() {
    let capture = Arc::new(Capture::default());
    let logger = Logger::builder().with_sink(capture.clone()).build().unwrap();
    log_info!(logger, "one");
    assert_eq!(logger.shutdown().unwrap(), 1);
    assert!(!logger.enabled(Severity::Info));
    log_info!(logger, "two");
    assert_eq!(capture.texts(), ["one"]);
}

#[test]
fn per_thread_order_is_preserved() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 200;

    let capture = Arc::new(Capture::default());
    let logger = Arc::new(
        Logger::builder()
            .with_sink(capture.clone())
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            logger
                .spawn_thread(format!("w{t}"), {
                    let logger = Arc::clone(&logger);
                    move || {
                        for i in 0..PER_THREAD {
                            log_at!(logger, Severity::Info, "{} {}", t, i);
                        }
                    }
                })
                .unwrap()
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.shutdown().unwrap();

    let messages = capture.messages.lock();
    assert_eq!(messages.len(), THREADS * PER_THREAD);
    let mut next = vec![0usize; THREADS];
    for message in messages.iter() {
        let mut parts = message.text.split(' ');
        let t: usize = parts.next().unwrap().parse().unwrap();
        let i: usize = parts.next().unwrap().parse().unwrap();
        assert_eq!(i, next[t], "thread {t} out of order");
        next[t] += 1;
        assert_eq!(message.thread.name, format!("w{t}"));
    }
}

#[test]
fn locked_transport_and_sink_removal() {
    let first = Arc::new(Capture::default());
    let second = Arc::new(Capture::default());
    let logger = Logger::builder()
        .with_transport(Transport::Locked)
        .build()
        .unwrap();
    let first_id = logger.add_sink(first.clone());
    logger.add_sink(second.clone());

    log_info!(logger, "one");
    // Wait until the consumer has handed the record to both sinks.
    while second.texts().is_empty() {
        thread::yield_now();
    }
    assert!(logger.remove_sink(first_id));
    log_info!(logger, "two");
    logger.shutdown().unwrap();

    assert_eq!(first.texts(), ["one"]);
    assert_eq!(second.texts(), ["one", "two"]);
}

#[test]
fn shutdown_retires_known_threads() {
    let capture = Arc::new(Capture::default());
    let logger = Logger::builder().with_sink(capture.clone()).build().unwrap();
    logger.spawn(11).unwrap();
    logger.spawn(5).unwrap();
    logger.rename(11, "late").unwrap();
    logger.shutdown().unwrap();

    assert_eq!(
        capture.lines(),
        ["spawn 11", "spawn 5", "rename 11 <unnamed> -> late", "exit 5 <unnamed>", "exit 11 late"]
    );
    assert!(logger.spawn(12).is_err());
    assert!(!logger.enabled(Severity::Fatal));
}

#[test]
fn terminal_sink_renders_through_logger() {
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let out = Shared::default();
    let logger = Logger::builder()
        .with_sink(Arc::new(Terminal::with_writer(Severity::Info, out.clone())))
        .build()
        .unwrap();
    log_info!(logger, "disk {}% full", 93);
    logger.shutdown().unwrap();

    let text = String::from_utf8(out.0.lock().clone()).unwrap();
    assert!(text.contains("INFO  [<unnamed>#"), "{text}");
    assert!(text.contains("tests/logging.rs:"), "{text}");
    assert!(text.trim_end().ends_with("| disk 93% full"), "{text}");
}
