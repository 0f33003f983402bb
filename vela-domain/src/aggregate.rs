//! Shared aggregate capability set
//!
//! Each concrete aggregate implements this independently; there is no
//! common base type. State is always derivable by folding the aggregate's
//! event sequence from the first event.

/// Capabilities common to every event-sourced aggregate
pub trait Aggregate {
    /// The aggregate's identifier type
    type Id;
    /// The event type the aggregate folds
    type Event;

    /// The aggregate's identifier
    fn id(&self) -> &Self::Id;

    /// The most recently applied event, if any
    fn last_event(&self) -> Option<&Self::Event>;

    /// How many events have been applied, including the creation event
    fn event_count(&self) -> usize;
}
