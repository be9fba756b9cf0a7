use tokio::sync::{mpsc, oneshot};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transport {
    Play,
    Pause,
    SkipNext,
    SkipPrevious,
    Seek(u64),
}

#[derive(Debug)]
pub(crate) enum SessionCmd {
    Transport(Transport),
    /// Tear the session down; the sender is notified once the engine is released.
    Shutdown(oneshot::Sender<()>),
}

/// Transport controls of a playback session.
///
/// Every call is one-way and never fails: without a live engine connection
/// (still connecting, failed, torn down, or detached) it is dropped.
#[derive(Debug, Clone, Default)]
pub struct PlaybackCommands {
    tx: Option<mpsc::UnboundedSender<SessionCmd>>,
}

impl PlaybackCommands {
    pub(crate) fn new(tx: mpsc::UnboundedSender<SessionCmd>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Controls that are not bound to any session.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn play(&self) {
        self.send(Transport::Play);
    }

    pub fn pause(&self) {
        self.send(Transport::Pause);
    }

    pub fn skip_next(&self) {
        self.send(Transport::SkipNext);
    }

    pub fn skip_previous(&self) {
        self.send(Transport::SkipPrevious);
    }

    /// Seek to an absolute position. The snapshot shows `target_ms` right away.
    pub fn seek(&self, target_ms: u64) {
        self.send(Transport::Seek(target_ms));
    }

    fn send(&self, cmd: Transport) {
        match &self.tx {
            Some(tx) => {
                if tx.send(SessionCmd::Transport(cmd)).is_err() {
                    trace!(?cmd, "session gone, command dropped");
                }
            }
            None => trace!(?cmd, "no session, command dropped"),
        }
    }
}
