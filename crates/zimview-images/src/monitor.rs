//! Scroll Monitor
//!
//! Turns a stream of raw viewport-change events into "scroll settled"
//! signals once no event has arrived for a quiet period.

use std::time::{Duration, Instant};

use smol::Timer;
use smol::channel::{Receiver, Sender};
use smol::future::FutureExt;

/// A raw viewport change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollEvent;

/// Quiet-period tracker
#[derive(Debug, Clone, Copy)]
pub struct Debounce {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, deadline: None }
    }

    /// An event arrived at `now`; push the deadline out
    pub fn bump(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once the quiet period has passed; disarms
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Sending side handed to whatever produces scroll events
#[derive(Debug, Clone)]
pub struct ScrollHandle {
    tx: Sender<ScrollEvent>,
}

impl ScrollHandle {
    /// Report a viewport change. Returns false once the monitor is gone.
    pub fn notify(&self) -> bool {
        self.tx.try_send(ScrollEvent).is_ok()
    }
}

/// Debounced scroll signal source
#[derive(Debug)]
pub struct ScrollMonitor {
    events: Receiver<ScrollEvent>,
    debounce: Debounce,
    attached: bool,
}

impl ScrollMonitor {
    /// Create a monitor and the handle feeding it
    pub fn new(quiet: Duration) -> (Self, ScrollHandle) {
        let (tx, rx) = smol::channel::unbounded();
        let monitor = Self {
            events: rx,
            debounce: Debounce::new(quiet),
            attached: true,
        };
        (monitor, ScrollHandle { tx })
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Stop listening; pending and future events are discarded
    pub fn detach(&mut self) {
        if self.attached {
            tracing::info!("Unloading scroll listener");
        }
        self.attached = false;
        self.events.close();
    }

    /// Wait for the next settled scroll.
    ///
    /// Returns false when the monitor is detached or every handle is gone.
    pub async fn settled(&mut self) -> bool {
        if !self.attached {
            return false;
        }

        if self.events.recv().await.is_err() {
            self.detach();
            return false;
        }
        self.debounce.bump(Instant::now());

        while let Some(deadline) = self.debounce.deadline() {
            let next = async { Some(self.events.recv().await) }
                .or(async {
                    Timer::at(deadline).await;
                    None
                })
                .await;

            match next {
                Some(Ok(ScrollEvent)) => self.debounce.bump(Instant::now()),
                Some(Err(_)) => {
                    // Senders gone mid-scroll: the last movement still counts.
                    self.debounce = Debounce::new(self.debounce.quiet);
                    self.attached = false;
                    return true;
                }
                None => {
                    self.debounce.poll(Instant::now());
                    if !self.debounce.is_armed() {
                        return true;
                    }
                }
            }
        }
        true
    }

    /// Drain queued events without waiting and report whether the quiet
    /// period has elapsed. For callers that run their own frame loop.
    pub fn poll_settled(&mut self, now: Instant) -> bool {
        if !self.attached {
            return false;
        }
        while self.events.try_recv().is_ok() {
            self.debounce.bump(now);
        }
        self.debounce.poll(now)
    }
}
