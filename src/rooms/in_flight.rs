use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

/// Users with a room submission currently waiting on the backend.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<Mutex<HashSet<String>>>);

/// Marks a submission as in flight until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: InFlight,
    key: String,
}

impl InFlight {
    /// `None` if `key` already has a submission in flight.
    pub fn begin(&self, key: &str) -> Option<InFlightGuard> {
        let inserted = self.0.lock().unwrap_or_else(PoisonError::into_inner).insert(key.to_owned());
        inserted.then(|| InFlightGuard { in_flight: self.clone(), key: key.to_owned() })
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).contains(key)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.0.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_submission_is_refused_until_the_first_ends() {
        let in_flight = InFlight::default();

        let guard = in_flight.begin("alice").unwrap();
        assert!(in_flight.is_active("alice"));
        assert!(in_flight.begin("alice").is_none());
        assert!(in_flight.begin("bob").is_some());

        drop(guard);
        assert!(!in_flight.is_active("alice"));
        assert!(in_flight.begin("alice").is_some());
    }
}
