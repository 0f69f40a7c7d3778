//! Search statistics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters collected over the lifetime of a solver.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Iterations of the top-level search loop.
    pub iterations: u64,
    /// Integer decisions.
    pub decisions: u64,
    /// Integer propagations.
    pub propagations: u64,
    /// Conflicts entered into resolution.
    pub conflicts: u64,
    /// Conflicts where precise explanation was abandoned.
    pub bailouts: u64,
    /// Learned lemmas.
    pub lemmas: u64,
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "iterations:   {}", self.iterations)?;
        writeln!(f, "decisions:    {}", self.decisions)?;
        writeln!(f, "propagations: {}", self.propagations)?;
        writeln!(f, "conflicts:    {}", self.conflicts)?;
        writeln!(f, "bailouts:     {}", self.bailouts)?;
        write!(f, "lemmas:       {}", self.lemmas)
    }
}
