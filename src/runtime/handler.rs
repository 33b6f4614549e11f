//! Host callbacks invoked by the poll loop.

use super::channel::Channel;
use super::connection::Connection;
use crate::protocol::Args;

/// Application side of the admin server.
///
/// Callbacks run synchronously on the polling thread. The engine never calls
/// back into itself, so a callback may freely write to or close the
/// connection it is given.
pub trait Handler<C: Channel> {
    /// Per-connection state, default-constructed on accept.
    type Data: Default;

    /// A new peer was admitted. Runs before the connection is counted as active.
    fn on_connect(&mut self, conn: &mut Connection<Self::Data, C>);

    /// One complete, non-empty command. `args` is only valid for this call.
    fn on_command(&mut self, conn: &mut Connection<Self::Data, C>, args: &Args<'_>);

    /// The connection was closed for `reason` and its slot is about to be recycled.
    fn on_disconnect(&mut self, conn: &mut Connection<Self::Data, C>, reason: &str);
}
