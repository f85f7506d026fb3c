// src/integrations/notifier.rs
//
// Toast surface. The controller only reports outcomes; rendering belongs to
// whoever implements this trait.

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn loading(&self, message: &str);
}

/// Writes toasts to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        log::info!("[toast:success] {}", message);
    }

    fn error(&self, message: &str) {
        log::warn!("[toast:error] {}", message);
    }

    fn loading(&self, message: &str) {
        log::debug!("[toast:loading] {}", message);
    }
}
