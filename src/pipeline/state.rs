use std::fmt;

use tracing::debug;

use crate::package::PackageName;

/// Lifecycle of one candidate's analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Pending,
    Cloning,
    Prepared,
    CloneFailed,
    Scanning,
    Classified,
    ScanFailed,
    CleanedUp,
}

impl AnalysisState {
    pub fn can_advance_to(self, next: AnalysisState) -> bool {
        use AnalysisState::*;
        matches!(
            (self, next),
            (Pending, Cloning)
                | (Cloning, Prepared)
                | (Cloning, CloneFailed)
                | (Prepared, Scanning)
                | (Scanning, Classified)
                | (Scanning, ScanFailed)
                | (CloneFailed, CleanedUp)
                | (Classified, CleanedUp)
                | (ScanFailed, CleanedUp)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == AnalysisState::CleanedUp
    }
}

impl fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisState::Pending => "pending",
            AnalysisState::Cloning => "cloning",
            AnalysisState::Prepared => "prepared",
            AnalysisState::CloneFailed => "clone-failed",
            AnalysisState::Scanning => "scanning",
            AnalysisState::Classified => "classified",
            AnalysisState::ScanFailed => "scan-failed",
            AnalysisState::CleanedUp => "cleaned-up",
        };
        f.write_str(name)
    }
}

/// Current state of one package's analysis, logging every transition
#[derive(Debug)]
pub(crate) struct StateTracker<'a> {
    package: &'a PackageName,
    state: AnalysisState,
}

impl<'a> StateTracker<'a> {
    pub(crate) fn new(package: &'a PackageName) -> Self {
        Self {
            package,
            state: AnalysisState::Pending,
        }
    }

    pub(crate) fn advance(&mut self, next: AnalysisState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        debug!("{}: {} -> {}", self.package, self.state, next);
        self.state = next;
    }

    pub(crate) fn state(&self) -> AnalysisState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AnalysisState::*;

    #[test]
    fn test_every_path_ends_in_cleanup() {
        for path in [
            vec![Pending, Cloning, CloneFailed, CleanedUp],
            vec![Pending, Cloning, Prepared, Scanning, Classified, CleanedUp],
            vec![Pending, Cloning, Prepared, Scanning, ScanFailed, CleanedUp],
        ] {
            assert!(path.windows(2).all(|w| w[0].can_advance_to(w[1])), "{path:?}");
            assert!(path.last().unwrap().is_terminal());
        }
    }

    #[test]
    fn test_no_shortcuts() {
        assert!(!Pending.can_advance_to(Scanning));
        assert!(!CloneFailed.can_advance_to(Scanning));
        assert!(!Cloning.can_advance_to(CleanedUp));
        assert!(!CleanedUp.can_advance_to(Pending));
    }

    #[test]
    fn test_tracker_follows_transitions() {
        let package = PackageName::parse("pkg").unwrap();
        let mut tracker = StateTracker::new(&package);
        assert_eq!(tracker.state(), Pending);
        tracker.advance(Cloning);
        tracker.advance(CloneFailed);
        tracker.advance(CleanedUp);
        assert!(tracker.state().is_terminal());
    }
}
