use chrono::{DateTime, Utc};

/// A fact published after a lifecycle operation commits.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **named** with a stable type identifier (e.g. "book_borrowed")
/// - published only after the unit of work that produced them committed
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier.
    fn event_type(&self) -> &'static str;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
