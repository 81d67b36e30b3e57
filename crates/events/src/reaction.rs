//! Ordered reaction registry (the derivation hook mechanics).
//!
//! A [`Hooks`] value holds every reaction registered for one record kind, each
//! tagged with the [`Phase`] it fires in. Running a phase invokes the matching
//! reactions synchronously, in registration order, against a shared context.
//!
//! ## Ordering
//!
//! Reactions observe each other: a reaction registered second sees every write
//! the first one made to the context and to the subject. There is no global
//! dispatch table; whoever owns the `Hooks` value decides what runs.
//!
//! ## Failure
//!
//! The first reaction that returns an error stops the phase. The error is
//! wrapped in a [`ReactionError`] naming the subject kind, the reaction and the
//! phase. The registry does not undo anything itself: callers run phases inside
//! an atomic unit of work and discard the unit when a phase fails.

use libris_core::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle phase a reaction is registered for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Before a create or update is written. Reactions may rewrite the subject.
    BeforePersist,
    /// After a row was written for the first time.
    AfterInsert,
    /// After a row was removed.
    AfterDelete,
    /// When an explicit domain event (such as a return) is raised.
    OnInvocation,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::BeforePersist => "before_persist",
            Phase::AfterInsert => "after_insert",
            Phase::AfterDelete => "after_delete",
            Phase::OnInvocation => "on_invocation",
        }
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derivation rule fired for a subject of type `S` within context `Cx`.
///
/// Plain functions and closures with the matching signature implement this
/// automatically, so most reactions are registered as `fn` items.
pub trait Reaction<Cx, S>: Send + Sync {
    fn react(&self, cx: &mut Cx, subject: &mut S) -> DomainResult<()>;
}

impl<Cx, S, F> Reaction<Cx, S> for F
where
    F: Fn(&mut Cx, &mut S) -> DomainResult<()> + Send + Sync,
{
    fn react(&self, cx: &mut Cx, subject: &mut S) -> DomainResult<()> {
        self(cx, subject)
    }
}

/// A reaction failed; the phase was cut short.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{subject} reaction '{reaction}' failed during {phase}: {source}")]
pub struct ReactionError {
    pub subject: &'static str,
    pub reaction: &'static str,
    pub phase: Phase,
    #[source]
    pub source: DomainError,
}

struct Registered<Cx, S> {
    name: &'static str,
    phase: Phase,
    reaction: Box<dyn Reaction<Cx, S>>,
}

/// Reactions registered for one subject kind, across all phases.
pub struct Hooks<Cx, S> {
    subject: &'static str,
    registered: Vec<Registered<Cx, S>>,
}

impl<Cx, S> Hooks<Cx, S> {
    /// An empty registry for the subject kind named `subject` (e.g. `"book"`).
    pub fn new(subject: &'static str) -> Self {
        Self {
            subject,
            registered: Vec::new(),
        }
    }

    /// Append a reaction to `phase`. It runs after every reaction already
    /// registered for that phase.
    pub fn register<R>(&mut self, phase: Phase, name: &'static str, reaction: R) -> &mut Self
    where
        R: Reaction<Cx, S> + 'static,
    {
        self.registered.push(Registered {
            name,
            phase,
            reaction: Box::new(reaction),
        });
        self
    }

    /// Names of the reactions registered for `phase`, in firing order.
    pub fn names(&self, phase: Phase) -> Vec<&'static str> {
        self.registered
            .iter()
            .filter(|r| r.phase == phase)
            .map(|r| r.name)
            .collect()
    }

    /// Fire every reaction registered for `phase`, in order.
    ///
    /// Returns how many reactions ran. Stops at the first failure.
    pub fn run(&self, phase: Phase, cx: &mut Cx, subject: &mut S) -> Result<usize, ReactionError> {
        let mut fired = 0;
        for r in self.registered.iter().filter(|r| r.phase == phase) {
            tracing::debug!(subject = self.subject, reaction = r.name, %phase, "firing reaction");
            r.reaction.react(cx, subject).map_err(|source| {
                tracing::warn!(
                    subject = self.subject,
                    reaction = r.name,
                    %phase,
                    error = %source,
                    "reaction failed"
                );
                ReactionError {
                    subject: self.subject,
                    reaction: r.name,
                    phase,
                    source,
                }
            })?;
            fired += 1;
        }
        Ok(fired)
    }
}

impl<Cx, S> core::fmt::Debug for Hooks<Cx, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hooks")
            .field("subject", &self.subject)
            .field(
                "registered",
                &self
                    .registered
                    .iter()
                    .map(|r| (r.phase, r.name))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
