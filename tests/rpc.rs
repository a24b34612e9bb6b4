use std::io::{Cursor, Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ringwire::Core::codec::to_frame;
use ringwire::Core::HybridBuffer;
use ringwire::MPMC::{ChannelBuilder, EventQueue, Poll, StopToken};
use ringwire::Net::{read_message, write_message, Kind, TcpClient, TcpServer, WireMessage};
use ringwire::RPC::{protocol, Reply};
use ringwire::{remote_method, Dispatcher, Error, Method, RemoteMethod, Service};

#[derive(Default)]
struct Calc {
    total: i64,
    log: Vec<String>,
}

impl Calc {
    fn add(&mut self, value: i64) -> i64 {
        self.total += value;
        self.total
    }

    fn note(&mut self, text: String) {
        self.log.push(text);
    }

    fn history(&mut self) -> Vec<String> {
        self.log.clone()
    }
}

remote_method!(Add for Calc = 0, fn(value: i64) -> i64 => add);
remote_method!(Note for Calc = 1, fn(text: String) -> () => note);
remote_method!(History for Calc = 2, fn() -> Vec<String> => history);

impl Service for Calc {
    type Message = HybridBuffer;
    const NAME: &'static str = "calc";

    fn methods() -> Vec<Method<Self>> {
        vec![Method::of::<Add>(), Method::of::<Note>(), Method::of::<History>()]
    }
}

struct Misordered;

impl Service for Misordered {
    type Message = HybridBuffer;
    const NAME: &'static str = "misordered";

    fn methods() -> Vec<Method<Self>> {
        vec![Method::raw("second", 1, |_, _, _| Ok(None))]
    }
}

#[test]
fn pipe_blocking_calls() {
    let (client, server) = ChannelBuilder::new()
        .with_call_timeout(Duration::from_secs(5))
        .build_pipe::<HybridBuffer, 4>()
        .split();
    let worker = thread::spawn(move || {
        let mut calc = Calc::default();
        let handled = server.run(&mut calc).unwrap();
        (handled, calc.total)
    });

    for i in 1..=10 {
        let total = client.call::<Add>((i,)).unwrap();
        assert_eq!(total, i * (i + 1) / 2);
    }
    client.call::<Note>(("hello".into(),)).unwrap();
    assert_eq!(client.call::<History>(()).unwrap(), vec!["hello"]);
    client.kill().unwrap();

    assert_eq!(worker.join().unwrap(), (12, 55));
}

#[test]
fn event_queue_many_producers() {
    const PRODUCERS: i64 = 4;
    const PER_PRODUCER: i64 = 500;

    let queue = EventQueue::<HybridBuffer, 8>::new();
    let server = queue.make_server();
    let worker = thread::spawn(move || {
        let mut calc = Calc::default();
        server.run(&mut calc).unwrap();
        calc.total
    });

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let client = queue.make_client();
            thread::spawn(move || {
                for _ in 0..PER_PRODUCER {
                    client.notify::<Add>((1,)).unwrap();
                }
            })
        })
        .collect();
    for handle in producers {
        handle.join().unwrap();
    }
    queue.make_client().kill().unwrap();

    assert_eq!(worker.join().unwrap(), PRODUCERS * PER_PRODUCER);
}

#[test]
fn stop_token_drains_then_exits() {
    let stop = StopToken::new();
    let queue = ChannelBuilder::new()
        .with_stop_token(stop.clone())
        .build_event_queue::<HybridBuffer, 16>();
    let client = queue.make_client();
    for _ in 0..10 {
        client.notify::<Add>((2,)).unwrap();
    }
    stop.stop();
    assert!(matches!(client.notify::<Add>((2,)), Err(Error::Disconnected)));

    let mut calc = Calc::default();
    assert_eq!(queue.make_server().run(&mut calc).unwrap(), 10);
    assert_eq!(calc.total, 20);
}

#[test]
fn poll_reports_each_state() {
    let queue = EventQueue::<HybridBuffer, 4>::new();
    let client = queue.make_client();
    let server = queue.make_server();
    let dispatcher = Dispatcher::<Calc>::new().unwrap();
    let mut calc = Calc::default();

    assert_eq!(server.poll(&dispatcher, &mut calc).unwrap(), Poll::Empty);
    client.notify::<Add>((5,)).unwrap();
    assert_eq!(server.poll(&dispatcher, &mut calc).unwrap(), Poll::Dispatched);
    client.kill().unwrap();
    assert_eq!(server.poll(&dispatcher, &mut calc).unwrap(), Poll::Shutdown);
    assert_eq!(calc.total, 5);
}

#[test]
fn unknown_opcode_ends_the_loop() {
    let queue = EventQueue::<HybridBuffer, 4>::new();
    let bogus: HybridBuffer = protocol::request(42, &()).unwrap();
    queue.queue().try_push(bogus).unwrap();

    let mut calc = Calc::default();
    let err = queue.make_server().run(&mut calc).unwrap_err();
    assert!(matches!(err, Error::UnknownOpcode { opcode: 42, methods: 3 }));
}

#[test]
fn misordered_table_is_rejected() {
    let err = Dispatcher::<Misordered>::new().unwrap_err();
    assert!(matches!(err, Error::MisorderedTable { position: 0, opcode: 1, .. }));
}

#[test]
fn call_times_out_without_server() {
    let (client, _server) = ChannelBuilder::new()
        .with_call_timeout(Duration::from_millis(20))
        .build_pipe::<HybridBuffer, 2>()
        .split();
    assert!(matches!(client.call::<Add>((1,)), Err(Error::Timeout)));
}

#[test]
fn late_response_is_never_returned_to_a_later_call() {
    let (client, server) = ChannelBuilder::new()
        .with_call_timeout(Duration::from_millis(30))
        .build_pipe::<HybridBuffer, 4>()
        .split();
    let worker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(150));
        let mut calc = Calc::default();
        let handled = server.run(&mut calc).unwrap();
        (handled, calc.total)
    });

    assert!(matches!(client.call::<Add>((1,)), Err(Error::Timeout)));
    assert!(client.is_broken());
    thread::sleep(Duration::from_millis(300));
    // The reply to the first call is now queued; it must not surface here.
    assert!(matches!(client.call::<Add>((1,)), Err(Error::Disconnected)));
    client.kill().unwrap();

    assert_eq!(worker.join().unwrap(), (1, 1));
}

#[test]
fn tcp_roundtrip() {
    let server = TcpServer::bind("127.0.0.1:0").unwrap();
    let addr = server.local_addr().unwrap();
    let notes = Arc::new(AtomicU64::new(0));
    let worker = {
        let notes = Arc::clone(&notes);
        thread::spawn(move || {
            let mut calc = Calc::default();
            let handled = server.serve_one(&mut calc).unwrap();
            notes.store(calc.log.len() as u64, Ordering::SeqCst);
            handled
        })
    };

    let mut client = TcpClient::connect(addr).unwrap();
    assert_eq!(client.call::<Add>((40,)).unwrap(), 40);
    client.notify::<Note>(("remote".into(),)).unwrap();
    assert_eq!(client.call::<Add>((2,)).unwrap(), 42);
    assert_eq!(client.call::<History>(()).unwrap(), vec!["remote"]);
    client.close().unwrap();

    assert_eq!(worker.join().unwrap(), 4);
    assert_eq!(notes.load(Ordering::SeqCst), 1);
}

#[test]
fn stream_serving_over_memory() {
    let mut input = Vec::new();
    let args: Vec<u8> = to_frame(&(3i64,)).unwrap();
    write_message(&mut input, &WireMessage::new(Kind::REQUEST, 0, args).unwrap()).unwrap();
    let args: Vec<u8> = to_frame(&("quiet".to_owned(),)).unwrap();
    write_message(&mut input, &WireMessage::new(Kind::EVENT, 1, args).unwrap()).unwrap();

    let mut stream = Duplex {
        input: Cursor::new(input),
        output: Vec::new(),
    };
    let mut calc = Calc::default();
    assert_eq!(ringwire::Net::serve(&mut stream, &mut calc).unwrap(), 2);
    assert_eq!(calc.log, vec!["quiet"]);

    let mut replies = Cursor::new(stream.output);
    let reply = read_message(&mut replies).unwrap().unwrap();
    assert_eq!(reply.kind(), Kind::RESPONSE);
    assert_eq!(reply.opcode(), 0);
    assert_eq!(reply.payload, 3i64.to_le_bytes());
    assert!(read_message(&mut replies).unwrap().is_none());
}

#[test]
fn corrupted_payload_fails_checksum() {
    let mut raw = Vec::new();
    let message = WireMessage::new(Kind::EVENT, 1, b"payload".to_vec()).unwrap();
    write_message(&mut raw, &message).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0xff;
    assert!(matches!(
        read_message(&mut Cursor::new(raw)),
        Err(Error::ChecksumMismatch { .. })
    ));
}

#[test]
fn wide_opcodes_do_not_fit_the_header() {
    assert!(matches!(
        WireMessage::new(Kind::REQUEST, 256, Vec::new()),
        Err(Error::OpcodeOutOfRange(256))
    ));
}

#[test]
fn discard_reply_on_blocking_dispatch() {
    let dispatcher = Dispatcher::<Calc>::new().unwrap();
    let mut calc = Calc::default();
    let req: HybridBuffer = protocol::request(Add::OPCODE, &(1i64,)).unwrap();
    assert!(dispatcher
        .dispatch(&mut calc, req.as_bytes(), Reply::Discard)
        .unwrap()
        .is_none());
    assert_eq!(calc.total, 1);
}

struct Duplex {
    input: Cursor<Vec<u8>>,
    output: Vec<u8>,
}

impl Read for Duplex {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for Duplex {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
