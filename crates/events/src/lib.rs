//! `libris-events` — lifecycle hooks and the committed-activity feed.
//!
//! - [`reaction`]: phases and the ordered reaction registry that drives derived state
//! - [`bus`] / [`in_memory_bus`]: pub/sub for facts published after commit

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod reaction;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use reaction::{Hooks, Phase, Reaction, ReactionError};
