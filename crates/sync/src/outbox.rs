//! Outgoing message queue shared by the tick loop and the writer task
//!
//! The tick loop pushes without blocking; the writer task awaits
//! [`Outbox::next`]. Forced locks go in with [`Outbox::supersede`], which
//! discards pending movement the lock makes redundant.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::protocol::SyncMessage;

#[derive(Debug, Default)]
pub struct Outbox {
    queue: Mutex<VecDeque<SyncMessage>>,
    ready: Notify,
    closed: AtomicBool,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<SyncMessage>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, message: SyncMessage) {
        if self.is_closed() {
            return;
        }
        self.lock().push_back(message);
        self.ready.notify_one();
    }

    /// Insert after every pending ordering-sensitive message, ahead of any
    /// trailing droppable ones.
    pub fn push_priority(&self, message: SyncMessage) {
        if self.is_closed() {
            return;
        }
        {
            let mut queue = self.lock();
            let at = queue
                .iter()
                .rposition(|m| !m.is_droppable())
                .map_or(0, |i| i + 1);
            queue.insert(at, message);
        }
        self.ready.notify_one();
    }

    /// Drop pending droppable messages, then priority-insert `message`.
    ///
    /// Returns how many messages were dropped.
    pub fn supersede(&self, message: SyncMessage) -> usize {
        if self.is_closed() {
            return 0;
        }
        let dropped = {
            let mut queue = self.lock();
            let before = queue.len();
            queue.retain(|m| !m.is_droppable());
            let dropped = before - queue.len();
            queue.push_back(message);
            dropped
        };
        self.ready.notify_one();
        dropped
    }

    pub fn pop(&self) -> Option<SyncMessage> {
        self.lock().pop_front()
    }

    /// Take every pending message.
    pub fn drain(&self) -> Vec<SyncMessage> {
        self.lock().drain(..).collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Stop accepting messages and wake the writer.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.ready.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait for the next message. `None` once closed and empty.
    pub async fn next(&self) -> Option<SyncMessage> {
        loop {
            if let Some(message) = self.pop() {
                return Some(message);
            }
            if self.is_closed() {
                return None;
            }
            self.ready.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionSet, KeyAction};
    use std::sync::Arc;
    use std::time::Duration;

    fn moves() -> SyncMessage {
        SyncMessage::Actions(ActionSet::from_actions(&[KeyAction::MoveLeft]))
    }

    #[test]
    fn test_priority_goes_after_ordered_messages() {
        let outbox = Outbox::new();
        outbox.push(SyncMessage::Entry(ActionSet::empty()));
        outbox.push(moves());
        outbox.push(SyncMessage::Gravity(1));
        outbox.push_priority(SyncMessage::Attack(2));

        assert_eq!(
            outbox.drain(),
            vec![
                SyncMessage::Entry(ActionSet::empty()),
                SyncMessage::Attack(2),
                moves(),
                SyncMessage::Gravity(1),
            ]
        );
    }

    #[test]
    fn test_priority_into_droppable_only_queue() {
        let outbox = Outbox::new();
        outbox.push(moves());
        outbox.push_priority(SyncMessage::Level(3));
        assert_eq!(outbox.pop(), Some(SyncMessage::Level(3)));
    }

    #[test]
    fn test_supersede_drops_movement() {
        let outbox = Outbox::new();
        let hold = SyncMessage::Actions(ActionSet::from_actions(&[KeyAction::Hold]));
        outbox.push(moves());
        outbox.push(hold.clone());
        outbox.push(SyncMessage::Gravity(2));
        outbox.push(moves());

        assert_eq!(outbox.supersede(SyncMessage::ToppedOut), 3);
        assert_eq!(outbox.drain(), vec![hold, SyncMessage::ToppedOut]);
    }

    #[test]
    fn test_closed_outbox_rejects_pushes() {
        let outbox = Outbox::new();
        outbox.push(SyncMessage::Bye);
        outbox.close();
        outbox.push(SyncMessage::Attack(1));
        assert_eq!(outbox.len(), 1);
        outbox.clear();
        assert!(outbox.is_empty());
    }

    #[tokio::test]
    async fn test_next_wakes_on_push_and_close() {
        let outbox = Arc::new(Outbox::new());
        let reader = {
            let outbox = Arc::clone(&outbox);
            tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(m) = outbox.next().await {
                    seen.push(m);
                }
                seen
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        outbox.push(SyncMessage::Attack(1));
        outbox.push(SyncMessage::Bye);
        tokio::time::sleep(Duration::from_millis(10)).await;
        outbox.close();

        let seen = tokio::time::timeout(Duration::from_secs(2), reader)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seen, vec![SyncMessage::Attack(1), SyncMessage::Bye]);
    }
}
