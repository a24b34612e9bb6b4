// Usage: cargo run --example rpc
//
// Serves the same key/value service twice: in-process over a Pipe, and
// across a loopback TCP connection.
use std::collections::BTreeMap;
use std::thread;

use ringwire::Core::HybridBuffer;
use ringwire::Net::{TcpClient, TcpServer};
use ringwire::{remote_method, ChannelBuilder, Method, Service};

#[derive(Default)]
struct Store {
    entries: BTreeMap<String, u64>,
}

impl Store {
    fn put(&mut self, key: String, value: u64) -> Option<u64> {
        self.entries.insert(key, value)
    }

    fn get(&mut self, key: String) -> Option<u64> {
        self.entries.get(&key).copied()
    }

    fn dump(&mut self) -> BTreeMap<String, u64> {
        self.entries.clone()
    }
}

remote_method!(Put for Store = 0, fn(key: String, value: u64) -> Option<u64> => put);
remote_method!(Get for Store = 1, fn(key: String) -> Option<u64> => get);
remote_method!(Dump for Store = 2, fn() -> BTreeMap<String, u64> => dump);

impl Service for Store {
    type Message = HybridBuffer;
    const NAME: &'static str = "store";

    fn methods() -> Vec<Method<Self>> {
        vec![Method::of::<Put>(), Method::of::<Get>(), Method::of::<Dump>()]
    }
}

fn main() -> ringwire::Result<()> {
    println!("--- pipe ---");
    let (client, server) = ChannelBuilder::new().build_pipe::<HybridBuffer, 16>().split();
    let worker = thread::spawn(move || {
        let mut store = Store::default();
        server.run(&mut store)
    });

    client.call::<Put>(("alpha".into(), 1))?;
    let previous = client.call::<Put>(("alpha".into(), 2))?;
    client.call::<Put>(("beta".into(), 3))?;
    println!("alpha was {previous:?}, beta is {:?}", client.call::<Get>(("beta".into(),))?);
    println!("store: {:?}", client.call::<Dump>(())?);
    client.kill()?;
    let handled = worker
        .join()
        .unwrap_or_else(|_| Err(ringwire::Error::Disconnected))?;
    println!("pipe server handled {handled} messages");

    println!("--- tcp ---");
    let listener = TcpServer::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let worker = thread::spawn(move || {
        let mut store = Store::default();
        listener.serve_one(&mut store)
    });

    let mut remote = TcpClient::connect(addr)?;
    remote.notify::<Put>(("gamma".into(), 7))?;
    println!("gamma over tcp: {:?}", remote.call::<Get>(("gamma".into(),))?);
    println!("missing over tcp: {:?}", remote.call::<Get>(("delta".into(),))?);
    remote.close()?;
    let handled = worker
        .join()
        .unwrap_or_else(|_| Err(ringwire::Error::Disconnected))?;
    println!("tcp server handled {handled} messages");
    Ok(())
}
