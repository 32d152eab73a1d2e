use logrelay_core::Status;
use std::fmt;

/// A subsystem `LoggingSystem::configure` can bring up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    Console,
    Registry,
    External,
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subsystem::Console => "console",
            Subsystem::Registry => "registry",
            Subsystem::External => "external",
        };
        f.write_str(name)
    }
}

/// Outcome of every subsystem a configure call attempted, in attempt order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigureReport {
    outcomes: Vec<(Subsystem, Status)>,
}

impl ConfigureReport {
    pub(crate) fn record(&mut self, subsystem: Subsystem, status: Status) {
        self.outcomes.push((subsystem, status));
    }

    pub fn outcomes(&self) -> &[(Subsystem, Status)] {
        &self.outcomes
    }

    /// Status of `subsystem`, or `None` if it was not attempted
    pub fn status_of(&self, subsystem: Subsystem) -> Option<Status> {
        self.outcomes
            .iter()
            .find(|(s, _)| *s == subsystem)
            .map(|(_, status)| *status)
    }

    /// Subsystems that failed, in attempt order
    pub fn failures(&self) -> Vec<(Subsystem, Status)> {
        self.outcomes
            .iter()
            .filter(|(_, status)| !status.is_ok())
            .copied()
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|(_, status)| status.is_ok())
    }
}
