// SPDX-License-Identifier: MIT

//! Phase-driven routing
//!
//! Routing looks only at the phase field. Nodes decide what happened by
//! setting the phase; the router decides what happens next.

use std::collections::HashMap;

use super::types::{Phase, Route};
use crate::waypoint::workflow::error::ValidationError;
use crate::waypoint::workflow::state::WorkflowState;

/// Table from phase tag to routing outcome
#[derive(Debug, Clone)]
pub struct PhaseRouter<P: Phase> {
    field: String,
    routes: HashMap<P, Route>,
}

impl<P: Phase> PhaseRouter<P> {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            routes: HashMap::new(),
        }
    }

    pub fn insert(&mut self, phase: P, route: Route) {
        self.routes.insert(phase, route);
    }

    /// Name of the state field holding the phase tag
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn routes(&self) -> impl Iterator<Item = (&P, &Route)> {
        self.routes.iter()
    }

    /// Every phase in the set must have a route
    pub fn ensure_total(&self) -> Result<(), ValidationError> {
        match P::ALL.iter().find(|p| !self.routes.contains_key(*p)) {
            Some(missing) => Err(ValidationError::UnroutedPhase(missing.as_str().to_string())),
            None => Ok(()),
        }
    }

    /// Read the current phase from state
    pub fn phase_of(&self, state: &WorkflowState) -> Result<P, ValidationError> {
        let raw = state
            .get(&self.field)
            .ok_or_else(|| ValidationError::UnknownField(self.field.clone()))?;
        raw.as_str()
            .and_then(P::parse)
            .ok_or_else(|| ValidationError::UnknownPhase(raw.to_string()))
    }

    pub fn route(&self, state: &WorkflowState) -> Result<&Route, ValidationError> {
        let phase = self.phase_of(state)?;
        self.routes
            .get(&phase)
            .ok_or_else(|| ValidationError::UnroutedPhase(phase.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoint::workflow::state::{FieldType, ReducerType, StateSchema, StateUpdate};
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Step {
        Begin,
        Wait,
        Done,
    }

    impl Phase for Step {
        const ALL: &'static [Self] = &[Step::Begin, Step::Wait, Step::Done];

        fn as_str(&self) -> &'static str {
            match self {
                Step::Begin => "begin",
                Step::Wait => "wait",
                Step::Done => "done",
            }
        }
    }

    fn state_in(phase: &str) -> WorkflowState {
        let schema = Arc::new(StateSchema::new().field(
            "phase",
            FieldType::String,
            ReducerType::Replace,
        ));
        WorkflowState::new(schema)
            .merge(StateUpdate::new().set("phase", phase))
            .unwrap()
    }

    fn full_router() -> PhaseRouter<Step> {
        let mut router = PhaseRouter::new("phase");
        router.insert(Step::Begin, Route::goto("work"));
        router.insert(Step::Wait, Route::Suspend);
        router.insert(Step::Done, Route::End);
        router
    }

    #[test]
    fn test_total_router_routes_every_phase() {
        let router = full_router();
        assert!(router.ensure_total().is_ok());
        for phase in Step::ALL {
            assert!(router.route(&state_in(phase.as_str())).is_ok());
        }
        assert_eq!(router.route(&state_in("wait")).unwrap(), &Route::Suspend);
    }

    #[test]
    fn test_missing_route_detected() {
        let mut router = PhaseRouter::new("phase");
        router.insert(Step::Begin, Route::goto("work"));
        router.insert(Step::Done, Route::End);
        assert_eq!(
            router.ensure_total().unwrap_err(),
            ValidationError::UnroutedPhase("wait".to_string())
        );
    }

    #[test]
    fn test_unknown_phase_value_fails() {
        let router = full_router();
        assert_eq!(
            router.route(&state_in("sideways")).unwrap_err(),
            ValidationError::UnknownPhase("\"sideways\"".to_string())
        );
    }
}
