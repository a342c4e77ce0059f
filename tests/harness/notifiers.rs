// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Notifier test doubles.

use async_trait::async_trait;
use contact_gate::{Notification, Notifier, NotifyError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Records every notification and succeeds.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, to: &str) -> usize {
        self.sent.lock().unwrap().iter().filter(|n| n.to == to).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Fails every send with the given error.
#[derive(Debug)]
pub struct FailingNotifier {
    error: NotifyError,
    attempts: AtomicUsize,
}

impl FailingNotifier {
    pub fn new(error: NotifyError) -> Self {
        Self {
            error,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// Delivers to `owner` but fails every other recipient, so acknowledgements
/// to submitters always fail.
#[derive(Debug)]
pub struct OwnerOnlyNotifier {
    owner: String,
    delivered: AtomicUsize,
    refused: AtomicUsize,
}

impl OwnerOnlyNotifier {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            delivered: AtomicUsize::new(0),
            refused: AtomicUsize::new(0),
        }
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    pub fn refused(&self) -> usize {
        self.refused.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for OwnerOnlyNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.to == self.owner {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        } else {
            self.refused.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::Rejected {
                status: 550,
                body: "mailbox unavailable".to_string(),
            })
        }
    }
}

/// Never finishes within any reasonable timeout.
#[derive(Debug)]
pub struct StalledNotifier(pub Duration);

#[async_trait]
impl Notifier for StalledNotifier {
    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}
