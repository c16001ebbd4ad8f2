use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

/// A single outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn welcome(to: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Welcome to Car Rental System".into(),
            body: "Thank you for registering with our car rental service!".into(),
        }
    }

    pub fn login(to: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "New Login Detected".into(),
            body: "A new login was detected on your account.".into(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> anyhow::Result<()>;
}

/// Records outbound mail in the log instead of delivering it.
#[derive(Clone)]
pub struct LogNotifier {
    from: String,
}

impl LogNotifier {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, n: Notification) -> anyhow::Result<()> {
        info!(from = %self.from, to = %n.to, subject = %n.subject, "email dispatched");
        Ok(())
    }
}

/// Fire-and-forget: the task is detached and its result only reaches the log.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) {
    tokio::spawn(async move {
        let to = notification.to.clone();
        if let Err(e) = notifier.send(notification).await {
            debug!(error = %e, %to, "notification dropped");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording(Mutex<Vec<Notification>>);

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, n: Notification) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(n);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        async fn send(&self, _n: Notification) -> anyhow::Result<()> {
            anyhow::bail!("smtp down")
        }
    }

    #[tokio::test]
    async fn dispatch_delivers_in_background() {
        let rec = Arc::new(Recording(Mutex::new(Vec::new())));
        dispatch(rec.clone(), Notification::welcome("a@b.com"));
        for _ in 0..50 {
            if !rec.0.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        let sent = rec.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@b.com");
        assert_eq!(sent[0].subject, "Welcome to Car Rental System");
    }

    #[tokio::test]
    async fn dispatch_swallows_failures() {
        dispatch(Arc::new(Failing), Notification::login("a@b.com"));
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
