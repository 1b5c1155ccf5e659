//! Cooperative shutdown token: schedulers stop accepting new work on
//! signal, but an in-flight chunk is allowed to run to completion (spec §5
//! "graceful shutdown"), since a lease only expires on status transition.

use tokio::sync::watch;

#[derive(Clone)]
pub struct Shutdown {
    receiver: watch::Receiver<bool>,
}

pub struct ShutdownHandle {
    sender: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn new() -> (Self, Shutdown) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, Shutdown { receiver })
    }

    /// Signal every scheduler holding a [`Shutdown`] token to stop
    /// accepting new work.
    pub fn trigger(&self) {
        let _ = self.sender.send(true);
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once [`ShutdownHandle::trigger`] is called.
    pub async fn triggered(&mut self) {
        let _ = self.receiver.wait_for(|v| *v).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_wakes_all_clones() {
        let (handle, mut a) = ShutdownHandle::new();
        let mut b = a.clone();
        handle.trigger();
        a.triggered().await;
        b.triggered().await;
        assert!(a.is_triggered());
        assert!(b.is_triggered());
    }

    #[tokio::test]
    async fn not_triggered_by_default() {
        let (_handle, token) = ShutdownHandle::new();
        assert!(!token.is_triggered());
    }
}
