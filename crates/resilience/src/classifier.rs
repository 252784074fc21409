//! Failure classification.

use crate::config::FailurePredicate;

/// Outcome of a retry sequence that did not produce a value
#[derive(Debug)]
pub(crate) enum Failure<E> {
    /// Handled failure left over once the retry budget ran out
    Exhausted(E),
    /// Failure no predicate matched; must reach the caller untouched
    Unhandled(E),
}

/// Decides whether a failure is eligible for retry and breaker accounting
pub struct ExceptionClassifier<E> {
    predicates: Vec<FailurePredicate<E>>,
}

impl<E> ExceptionClassifier<E> {
    pub fn new(predicates: Vec<FailurePredicate<E>>) -> Self {
        Self { predicates }
    }

    /// True on the first matching predicate; false when none match or none are configured
    pub fn is_handled(&self, failure: &E) -> bool {
        self.predicates.iter().any(|predicate| predicate(failure))
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl<E> std::fmt::Debug for ExceptionClassifier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExceptionClassifier({} predicates)", self.predicates.len())
    }
}
