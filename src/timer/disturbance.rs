//! Disturbance detection
//!
//! The host shell publishes raw input events; a [`DisturbanceMonitor`]
//! listens to them only while an attempt is running and reports the ones
//! that count as "you moved".

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};

/// Capacity of the in-process input bus
const INPUT_BUS_CAPACITY: usize = 64;

/// Raw input events from the hosting surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Pointer moved over the surface
    PointerMoved,
    /// Any key pressed
    KeyPressed,
    /// The surface was hidden or shown
    VisibilityChanged { hidden: bool },
}

impl InputEvent {
    /// Whether this event invalidates a running attempt
    ///
    /// Becoming visible again is not a disturbance; losing visibility is.
    pub fn is_disturbance(&self) -> bool {
        match self {
            InputEvent::PointerMoved | InputEvent::KeyPressed => true,
            InputEvent::VisibilityChanged { hidden } => *hidden,
        }
    }
}

/// Host facility that delivers input events
pub trait InputSource: Send + Sync {
    /// Start listening for input
    fn subscribe(&self) -> InputSubscription;
}

/// A live listener registration
///
/// Dropping the subscription unsubscribes it.
#[derive(Debug)]
pub struct InputSubscription {
    receiver: broadcast::Receiver<InputEvent>,
}

impl InputSubscription {
    pub fn new(receiver: broadcast::Receiver<InputEvent>) -> Self {
        Self { receiver }
    }

    /// Explicitly stop listening
    pub fn unsubscribe(self) {}

    /// Next event, or `None` once the source is gone
    ///
    /// A listener that fell behind resumes at the oldest event the source
    /// still holds.
    pub async fn recv(&mut self) -> Option<InputEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("[INPUT] Listener lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// In-process input source the shell publishes events into
#[derive(Debug, Clone)]
pub struct InputBus {
    sender: broadcast::Sender<InputEvent>,
}

impl Default for InputBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(INPUT_BUS_CAPACITY);
        Self { sender }
    }

    /// Deliver an event to every current listener
    ///
    /// Returns the number of listeners reached. Events with no listeners
    /// are simply dropped.
    pub fn publish(&self, event: InputEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl InputSource for InputBus {
    fn subscribe(&self) -> InputSubscription {
        InputSubscription::new(self.sender.subscribe())
    }
}

/// Listens for disturbances while an attempt is running
///
/// Mirrors [`super::TickTimer`]: armed it yields disturbances, disarmed it
/// holds no subscription and pends forever.
#[derive(Debug, Default)]
pub struct DisturbanceMonitor {
    subscription: Option<InputSubscription>,
}

impl DisturbanceMonitor {
    pub fn new() -> Self {
        Self { subscription: None }
    }

    /// Subscribe to `source` if not already listening
    pub fn arm(&mut self, source: &dyn InputSource) {
        if self.subscription.is_none() {
            self.subscription = Some(source.subscribe());
            log::debug!("[INPUT] Listening for disturbances");
        }
    }

    /// Unsubscribe
    pub fn disarm(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            log::debug!("[INPUT] Stopped listening for disturbances");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Wait for the next event that counts as a disturbance
    ///
    /// Cancel-safe. If the source closes, the monitor disarms itself.
    pub async fn next_disturbance(&mut self) -> InputEvent {
        loop {
            let Some(subscription) = self.subscription.as_mut() else {
                return std::future::pending().await;
            };
            match subscription.recv().await {
                Some(event) if event.is_disturbance() => return event,
                Some(_) => continue,
                None => {
                    log::warn!("[INPUT] Input source closed");
                    self.subscription = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use test_case::test_case;
    use tokio::time::timeout;

    #[test_case(InputEvent::PointerMoved, true ; "pointer")]
    #[test_case(InputEvent::KeyPressed, true ; "key")]
    #[test_case(InputEvent::VisibilityChanged { hidden: true }, true ; "hidden")]
    #[test_case(InputEvent::VisibilityChanged { hidden: false }, false ; "shown")]
    fn test_is_disturbance(event: InputEvent, expected: bool) {
        assert_eq!(event.is_disturbance(), expected);
    }

    #[test]
    fn test_subscription_lifetime() {
        let bus = InputBus::new();
        assert_eq!(bus.listener_count(), 0);

        let subscription = bus.subscribe();
        assert_eq!(bus.listener_count(), 1);
        assert_eq!(bus.publish(InputEvent::KeyPressed), 1);

        subscription.unsubscribe();
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(bus.publish(InputEvent::KeyPressed), 0);
    }

    #[tokio::test]
    async fn test_monitor_skips_non_disturbances() {
        let bus = InputBus::new();
        let mut monitor = DisturbanceMonitor::new();
        monitor.arm(&bus);

        bus.publish(InputEvent::VisibilityChanged { hidden: false });
        bus.publish(InputEvent::PointerMoved);

        let event = monitor.next_disturbance().await;
        assert_eq!(event, InputEvent::PointerMoved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_monitor_ignores_input() {
        let bus = InputBus::new();
        let mut monitor = DisturbanceMonitor::new();
        monitor.arm(&bus);
        monitor.disarm();
        assert!(!monitor.is_armed());
        assert_eq!(bus.listener_count(), 0);

        bus.publish(InputEvent::KeyPressed);
        let result = timeout(Duration::from_secs(1), monitor.next_disturbance()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_lagged_subscription_resumes_with_retained_events() {
        let bus = InputBus::new();
        let mut subscription = bus.subscribe();
        for _ in 0..INPUT_BUS_CAPACITY * 2 {
            bus.publish(InputEvent::VisibilityChanged { hidden: false });
        }
        assert_eq!(
            subscription.recv().await,
            Some(InputEvent::VisibilityChanged { hidden: false })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_lag_of_harmless_events_is_not_a_disturbance() {
        let bus = InputBus::new();
        let mut monitor = DisturbanceMonitor::new();
        monitor.arm(&bus);
        for _ in 0..100 {
            bus.publish(InputEvent::VisibilityChanged { hidden: false });
        }

        let result = timeout(Duration::from_secs(1), monitor.next_disturbance()).await;
        assert!(result.is_err());
        assert!(monitor.is_armed());
    }

    #[tokio::test]
    async fn test_disturbance_after_lag_still_detected() {
        let bus = InputBus::new();
        let mut monitor = DisturbanceMonitor::new();
        monitor.arm(&bus);
        for _ in 0..100 {
            bus.publish(InputEvent::VisibilityChanged { hidden: false });
        }
        bus.publish(InputEvent::VisibilityChanged { hidden: true });

        let event = monitor.next_disturbance().await;
        assert_eq!(event, InputEvent::VisibilityChanged { hidden: true });
    }

    #[tokio::test]
    async fn test_arm_is_idempotent() {
        let bus = InputBus::new();
        let mut monitor = DisturbanceMonitor::new();
        monitor.arm(&bus);
        monitor.arm(&bus);
        assert_eq!(bus.listener_count(), 1);
    }
}
