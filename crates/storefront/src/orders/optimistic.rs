/// A speculative change and what became of it.
///
/// `begin` captures the prior state next to the speculative one. The request outcome
/// then resolves it: `commit` keeps the server's value, `roll_back` restores the prior
/// state exactly and carries the failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Optimistic<T, E = String> {
    Pending { prior: T, speculative: T },
    Committed(T),
    RolledBack { restored: T, error: E },
}

impl<T: Clone, E> Optimistic<T, E> {
    /// Starts an update by applying `change` to a copy of `prior`.
    pub fn begin(prior: T, change: impl FnOnce(&mut T)) -> Self {
        let mut speculative = prior.clone();
        change(&mut speculative);
        Optimistic::Pending { prior, speculative }
    }

    /// Resolves with the server's value. Already resolved values are left alone.
    pub fn commit(self, confirmed: T) -> Self {
        match self {
            Optimistic::Pending { .. } => Optimistic::Committed(confirmed),
            resolved => resolved,
        }
    }

    /// Resolves by restoring the prior value.
    pub fn roll_back(self, error: E) -> Self {
        match self {
            Optimistic::Pending { prior, .. } => Optimistic::RolledBack {
                restored: prior,
                error,
            },
            resolved => resolved,
        }
    }

    /// The value a UI should show right now.
    pub fn current(&self) -> &T {
        match self {
            Optimistic::Pending { speculative, .. } => speculative,
            Optimistic::Committed(value) => value,
            Optimistic::RolledBack { restored, .. } => restored,
        }
    }

    pub fn into_current(self) -> T {
        match self {
            Optimistic::Pending { speculative, .. } => speculative,
            Optimistic::Committed(value) => value,
            Optimistic::RolledBack { restored, .. } => restored,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Optimistic::Committed(_))
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Optimistic::RolledBack { error, .. } => Some(error),
            _ => None,
        }
    }
}
