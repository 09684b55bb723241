//! User-facing notifications raised by toolbar actions.

/// Blocking user interaction the toolbar needs: a one-line error alert and
/// a free-text prompt. The browser bridge maps these to `window.alert` and
/// `window.prompt`.
pub trait Notifier {
    fn alert(&self, message: &str);

    /// `None` when the user cancelled.
    fn prompt(&self, message: &str) -> Option<String>;
}

/// Notifier for hosts without a UI: alerts go to the log, prompts cancel.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        log::warn!("{message}");
    }

    fn prompt(&self, message: &str) -> Option<String> {
        log::warn!("prompt unavailable, treating as cancelled: {message}");
        None
    }
}
