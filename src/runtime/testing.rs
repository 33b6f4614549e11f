//! In-memory channel and listener doubles for runtime tests.

use super::channel::{Channel, Listener, Recv};
use super::connection::Connection;
use super::handler::Handler;
use crate::protocol::Args;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::rc::Rc;

enum Step {
    Data(Vec<u8>),
    Closed,
    Error(io::ErrorKind),
}

#[derive(Default)]
struct State {
    steps: VecDeque<Step>,
    sent: Vec<u8>,
    more: Vec<bool>,
    send_chunk: Option<usize>,
    blocked_sends: usize,
    fail_sends: Option<io::ErrorKind>,
    dropped: bool,
}

thread_local! {
    static NEXT_PORT: Cell<u16> = const { Cell::new(40000) };
}

/// Scripted channel: receives return queued chunks in order, then would-block.
pub struct MockChannel {
    state: Rc<RefCell<State>>,
    peer: SocketAddr,
}

/// Test-side handle to a [`MockChannel`].
#[derive(Clone)]
pub struct MockHandle {
    state: Rc<RefCell<State>>,
    peer: SocketAddr,
}

impl MockChannel {
    pub fn new() -> (Self, MockHandle) {
        let port = NEXT_PORT.with(|next| {
            let port = next.get();
            next.set(port.wrapping_add(1));
            port
        });
        let peer = SocketAddr::from(([127, 0, 0, 1], port));
        let state = Rc::new(RefCell::new(State::default()));
        (
            Self {
                state: Rc::clone(&state),
                peer,
            },
            MockHandle { state, peer },
        )
    }
}

impl Drop for MockChannel {
    fn drop(&mut self) {
        self.state.borrow_mut().dropped = true;
    }
}

impl Channel for MockChannel {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Recv> {
        let mut state = self.state.borrow_mut();
        match state.steps.pop_front() {
            None => Ok(Recv::WouldBlock),
            Some(Step::Closed) => Ok(Recv::Closed),
            Some(Step::Error(kind)) => Err(io::Error::new(kind, "mock failure")),
            Some(Step::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    data.drain(..n);
                    state.steps.push_front(Step::Data(data));
                }
                Ok(Recv::Data(n))
            }
        }
    }

    fn send(&mut self, buf: &[u8], more: bool) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        if let Some(kind) = state.fail_sends {
            return Err(io::Error::new(kind, "mock send failure"));
        }
        if state.blocked_sends > 0 {
            state.blocked_sends -= 1;
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let n = state.send_chunk.map_or(buf.len(), |chunk| chunk.min(buf.len()));
        state.sent.extend_from_slice(&buf[..n]);
        state.more.push(more);
        Ok(n)
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.peer)
    }
}

impl MockHandle {
    /// Queue bytes for the next receive.
    pub fn push(&self, data: &[u8]) {
        self.state
            .borrow_mut()
            .steps
            .push_back(Step::Data(data.to_vec()));
    }

    /// Queue an orderly close.
    pub fn push_close(&self) {
        self.state.borrow_mut().steps.push_back(Step::Closed);
    }

    /// Queue a transport error.
    pub fn push_error(&self, kind: io::ErrorKind) {
        self.state.borrow_mut().steps.push_back(Step::Error(kind));
    }

    pub fn sent(&self) -> Vec<u8> {
        self.state.borrow().sent.clone()
    }

    pub fn sent_str(&self) -> String {
        String::from_utf8_lossy(&self.state.borrow().sent).into_owned()
    }

    pub fn more_hints(&self) -> Vec<bool> {
        self.state.borrow().more.clone()
    }

    pub fn set_send_chunk(&self, chunk: usize) {
        self.state.borrow_mut().send_chunk = Some(chunk);
    }

    pub fn block_sends(&self, count: usize) {
        self.state.borrow_mut().blocked_sends = count;
    }

    pub fn fail_sends(&self, kind: io::ErrorKind) {
        self.state.borrow_mut().fail_sends = Some(kind);
    }

    /// Whether the engine has dropped (closed) the channel.
    pub fn is_dropped(&self) -> bool {
        self.state.borrow().dropped
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        Some(self.peer)
    }
}

/// Listener that hands out queued mock channels.
pub struct MockListener {
    pending: Rc<RefCell<VecDeque<io::Result<MockChannel>>>>,
}

/// Test-side handle to a [`MockListener`].
#[derive(Clone)]
pub struct MockConnector {
    pending: Rc<RefCell<VecDeque<io::Result<MockChannel>>>>,
}

impl MockListener {
    pub fn new() -> (Self, MockConnector) {
        let pending = Rc::new(RefCell::new(VecDeque::new()));
        (
            Self {
                pending: Rc::clone(&pending),
            },
            MockConnector { pending },
        )
    }
}

impl MockConnector {
    /// Queue a new inbound connection and return its handle.
    pub fn connect(&self) -> MockHandle {
        let (channel, handle) = MockChannel::new();
        self.pending.borrow_mut().push_back(Ok(channel));
        handle
    }

    /// Queue a failed accept.
    pub fn fail(&self, kind: io::ErrorKind) {
        self.pending
            .borrow_mut()
            .push_back(Err(io::Error::new(kind, "mock accept failure")));
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl Listener for MockListener {
    type Channel = MockChannel;

    fn accept(&mut self) -> io::Result<Option<MockChannel>> {
        self.pending.borrow_mut().pop_front().transpose()
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(SocketAddr::from(([127, 0, 0, 1], 1234)))
    }
}

/// Handler that records every callback.
///
/// `echo <arg>` replies with the argument and `quit` closes with "user quit".
/// With `kick_on_connect` set, connections are closed from `on_connect`.
#[derive(Default)]
pub struct Recorder {
    pub connects: Vec<usize>,
    pub commands: Vec<(usize, Vec<String>)>,
    pub disconnects: Vec<(usize, String)>,
    pub kick_on_connect: bool,
}

impl Recorder {
    /// Arguments of every dispatched command, ignoring which slot sent it.
    pub fn args(&self) -> Vec<Vec<String>> {
        self.commands.iter().map(|(_, args)| args.clone()).collect()
    }
}

impl Handler<MockChannel> for Recorder {
    type Data = u32;

    fn on_connect(&mut self, conn: &mut Connection<u32, MockChannel>) {
        self.connects.push(conn.slot());
        if self.kick_on_connect {
            conn.close("kicked");
        }
    }

    fn on_command(&mut self, conn: &mut Connection<u32, MockChannel>, args: &Args<'_>) {
        conn.data += 1;
        self.commands.push((
            conn.slot(),
            args.iter()
                .map(|arg| String::from_utf8_lossy(arg).into_owned())
                .collect(),
        ));
        match args.command() {
            b"echo" => {
                let reply = args.get(1).unwrap_or_default();
                let _ = conn.write(reply, true);
                let _ = conn.write(b"\n", false);
            }
            b"quit" => conn.close("user quit"),
            _ => {}
        }
    }

    fn on_disconnect(&mut self, conn: &mut Connection<u32, MockChannel>, reason: &str) {
        assert!(!conn.is_open());
        self.disconnects.push((conn.slot(), reason.to_string()));
    }
}
