//! Fixed-size connection pool.
//!
//! Slots are allocated once and reused. The first `active` slots hold live
//! connections; removing one swaps it with the last live slot, so removal is
//! O(1) but iteration order is not preserved across disconnects.

use super::buffer::RecvBuffer;
use super::channel::{Channel, Listener, Recv};
use super::connection::Connection;
use super::handler::Handler;
use crate::error::reason;
use crate::protocol::Tokenizer;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

struct Slot<D, C, const CAP: usize> {
    conn: Connection<D, C>,
    rx: RecvBuffer<CAP>,
    /// Inactivity deadline, `None` when timeouts are disabled.
    deadline: Option<Instant>,
}

/// Pool of `MAX_CONNS` connection slots with `CAP`-byte receive buffers.
pub struct ConnectionPool<D, C, const CAP: usize, const MAX_CONNS: usize> {
    slots: Box<[Slot<D, C, CAP>]>,
    active: usize,
    /// Reused storage for the reason handed to `on_disconnect`.
    reason: String,
}

impl<D: Default, C: Channel, const CAP: usize, const MAX_CONNS: usize>
    ConnectionPool<D, C, CAP, MAX_CONNS>
{
    pub fn new() -> Self {
        assert!(MAX_CONNS > 0, "pool needs at least one slot");
        let slots = (0..MAX_CONNS)
            .map(|id| Slot {
                conn: Connection::new(id),
                rx: RecvBuffer::new(),
                deadline: None,
            })
            .collect();

        Self {
            slots,
            active: 0,
            reason: String::with_capacity(64),
        }
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    pub fn is_full(&self) -> bool {
        self.active >= MAX_CONNS
    }

    pub fn capacity(&self) -> usize {
        MAX_CONNS
    }

    /// Live connections in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Connection<D, C>> {
        self.slots[..self.active].iter().map(|slot| &slot.conn)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Connection<D, C>> {
        self.slots[..self.active].iter_mut().map(|slot| &mut slot.conn)
    }

    /// Admit at most one pending connection into the first free slot.
    ///
    /// Returns `true` if a connection was admitted.
    pub fn try_accept<L, H>(
        &mut self,
        listener: &mut L,
        handler: &mut H,
        deadline: Option<Instant>,
    ) -> bool
    where
        L: Listener<Channel = C>,
        H: Handler<C, Data = D>,
    {
        if self.is_full() {
            return false;
        }

        let channel = match listener.accept() {
            Ok(Some(channel)) => channel,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "Failed to accept admin connection");
                return false;
            }
        };

        let slot = &mut self.slots[self.active];
        slot.conn.open(channel);
        slot.rx.reset();
        slot.deadline = deadline;

        debug!(
            slot = slot.conn.slot(),
            peer = ?slot.conn.peer_addr(),
            active = self.active + 1,
            "Accepted admin connection"
        );

        handler.on_connect(&mut slot.conn);
        self.active += 1;
        true
    }

    /// Service every live connection once: read, dispatch, check the
    /// inactivity deadline, and recycle slots of closed connections.
    pub fn sweep<H>(
        &mut self,
        handler: &mut H,
        tokenizer: &mut Tokenizer,
        now: Instant,
        idle_timeout: Option<Duration>,
    ) where
        H: Handler<C, Data = D>,
    {
        let mut i = 0;
        while i < self.active {
            let slot = &mut self.slots[i];
            service(slot, handler, tokenizer, now, idle_timeout);

            if slot.deadline.is_some_and(|deadline| now > deadline) {
                slot.conn.close(reason::TIMEOUT);
            }

            if slot.conn.is_open() {
                i += 1;
                continue;
            }

            retire(&mut slot.conn, handler, &mut self.reason);
            self.active -= 1;
            self.slots.swap(i, self.active);
        }
    }

    /// Close every live connection with `why`, notifying the handler.
    pub fn close_all<H>(&mut self, handler: &mut H, why: &str)
    where
        H: Handler<C, Data = D>,
    {
        while self.active > 0 {
            self.active -= 1;
            let slot = &mut self.slots[self.active];
            slot.conn.close(why);
            retire(&mut slot.conn, handler, &mut self.reason);
        }
    }
}

impl<D: Default, C: Channel, const CAP: usize, const MAX_CONNS: usize> Default
    for ConnectionPool<D, C, CAP, MAX_CONNS>
{
    fn default() -> Self {
        Self::new()
    }
}

/// Hand a closed connection to `on_disconnect` and drop its payload.
fn retire<D, C, H>(conn: &mut Connection<D, C>, handler: &mut H, why: &mut String)
where
    D: Default,
    C: Channel,
    H: Handler<C, Data = D>,
{
    why.clear();
    why.push_str(conn.last_error());
    debug!(
        slot = conn.slot(),
        peer = ?conn.peer_addr(),
        reason = %why,
        "Admin connection closed"
    );
    handler.on_disconnect(conn, why);
    conn.data = D::default();
}

/// One read attempt followed by dispatch of every complete command in it.
fn service<D, C, H, const CAP: usize>(
    slot: &mut Slot<D, C, CAP>,
    handler: &mut H,
    tokenizer: &mut Tokenizer,
    now: Instant,
    idle_timeout: Option<Duration>,
) where
    D: Default,
    C: Channel,
    H: Handler<C, Data = D>,
{
    let Slot { conn, rx, deadline } = slot;
    let Some(channel) = conn.channel_mut() else {
        return;
    };

    match rx.fill(channel) {
        Ok(Recv::Data(_)) => {}
        Ok(Recv::WouldBlock) => return,
        Ok(Recv::Closed) => {
            conn.close(reason::REMOTE_CLOSE);
            return;
        }
        Err(e) => {
            conn.close_with_error("read error", &e);
            return;
        }
    }

    if let Some(timeout) = idle_timeout {
        *deadline = Some(now + timeout);
    }

    // Dispatch continues past a host close; writes from those commands fail.
    let remaining = tokenizer.tokenize(rx.window(), |args| {
        trace!(slot = conn.slot(), argc = args.len(), "Dispatching admin command");
        handler.on_command(conn, args);
    });

    if rx.consume(remaining).is_err() {
        warn!(
            slot = conn.slot(),
            peer = ?conn.peer_addr(),
            capacity = CAP,
            "Admin command exceeds receive buffer"
        );
        conn.close(reason::RECV_BUF_FULL);
    }
}
