//! Generation phase state machine
//!
//! ```text
//! Start -> Extracting -> Resolving -> Processing -> Built
//!             |             |             |
//!             +-------------+-------------+--> Failed
//! ```

use std::fmt::{self, Display, Formatter};

/// Phase of one scenario generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationPhase {
    /// Nothing done yet
    Start,
    /// Asking the extractor for declarations
    Extracting,
    /// Resolving references and validating the scenario
    Resolving,
    /// Running the archive pipeline
    Processing,
    /// Scenario published
    Built,
    /// Generation aborted
    Failed,
}

impl GenerationPhase {
    /// Check if no further transition is possible
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Built | Self::Failed)
    }

    /// Phases reachable from `self`
    #[must_use]
    pub fn allowed_transitions(self) -> &'static [GenerationPhase] {
        match self {
            Self::Start => &[Self::Extracting],
            Self::Extracting => &[Self::Resolving, Self::Failed],
            Self::Resolving => &[Self::Processing, Self::Failed],
            Self::Processing => &[Self::Built, Self::Failed],
            Self::Built | Self::Failed => &[],
        }
    }

    /// Check if `self -> to` is legal
    #[must_use]
    pub fn can_transition(self, to: GenerationPhase) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

impl Display for GenerationPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Extracting => "extracting",
            Self::Resolving => "resolving",
            Self::Processing => "processing",
            Self::Built => "built",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks the current phase of one generation run
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    current: GenerationPhase,
}

impl PhaseTracker {
    pub(crate) fn new() -> Self {
        Self {
            current: GenerationPhase::Start,
        }
    }

    pub(crate) fn current(&self) -> GenerationPhase {
        self.current
    }

    pub(crate) fn advance(&mut self, to: GenerationPhase) {
        debug_assert!(
            self.current.can_transition(to),
            "illegal generation transition {} -> {to}",
            self.current
        );
        tracing::trace!(from = %self.current, to = %to, "generation phase");
        self.current = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_phase() -> impl Strategy<Value = GenerationPhase> {
        prop_oneof![
            Just(GenerationPhase::Start),
            Just(GenerationPhase::Extracting),
            Just(GenerationPhase::Resolving),
            Just(GenerationPhase::Processing),
            Just(GenerationPhase::Built),
            Just(GenerationPhase::Failed),
        ]
    }

    #[test]
    fn happy_path_is_legal() {
        let mut tracker = PhaseTracker::new();
        for phase in [
            GenerationPhase::Extracting,
            GenerationPhase::Resolving,
            GenerationPhase::Processing,
            GenerationPhase::Built,
        ] {
            tracker.advance(phase);
        }
        assert_eq!(tracker.current(), GenerationPhase::Built);
    }

    #[test]
    fn start_cannot_fail_directly() {
        assert!(!GenerationPhase::Start.can_transition(GenerationPhase::Failed));
        assert!(GenerationPhase::Extracting.can_transition(GenerationPhase::Failed));
    }

    proptest! {
        #[test]
        fn terminal_phases_have_no_transitions(phase in any_phase()) {
            prop_assert_eq!(phase.is_terminal(), phase.allowed_transitions().is_empty());
        }

        #[test]
        fn no_phase_transitions_to_itself(phase in any_phase()) {
            prop_assert!(!phase.can_transition(phase));
        }

        #[test]
        fn start_is_never_reentered(from in any_phase()) {
            prop_assert!(!from.can_transition(GenerationPhase::Start));
        }
    }
}
