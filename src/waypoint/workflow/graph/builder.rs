// SPDX-License-Identifier: MIT

//! Graph construction and validation

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::node::Node;
use super::router::PhaseRouter;
use super::types::{Phase, Route};
use crate::waypoint::workflow::error::ValidationError;
use crate::waypoint::workflow::state::{FieldType, ReducerType, StateSchema, WorkflowState};

pub const DEFAULT_PHASE_FIELD: &str = "current_phase";
pub const DEFAULT_MESSAGES_FIELD: &str = "messages";

/// Collects nodes, edges and routes; `compile` checks them
pub struct GraphBuilder<P: Phase> {
    name: String,
    schema: StateSchema,
    nodes: Vec<(String, Arc<dyn Node>)>,
    entry: Option<String>,
    resume: Option<String>,
    edges: HashMap<String, Route>,
    routes: Vec<(P, Route)>,
    interrupts: HashSet<String>,
    phase_field: String,
    messages_field: String,
}

impl<P: Phase> GraphBuilder<P> {
    pub fn new(name: impl Into<String>, schema: StateSchema) -> Self {
        Self {
            name: name.into(),
            schema,
            nodes: Vec::new(),
            entry: None,
            resume: None,
            edges: HashMap::new(),
            routes: Vec::new(),
            interrupts: HashSet::new(),
            phase_field: DEFAULT_PHASE_FIELD.to_string(),
            messages_field: DEFAULT_MESSAGES_FIELD.to_string(),
        }
    }

    pub fn add_node<N: Node + 'static>(mut self, id: &str, node: N) -> Self {
        self.nodes.push((id.to_string(), Arc::new(node)));
        self
    }

    /// Node the run starts at
    pub fn set_entry(mut self, id: &str) -> Self {
        self.entry = Some(id.to_string());
        self
    }

    /// Node a suspended run continues from once input arrives
    pub fn set_resume(mut self, id: &str) -> Self {
        self.resume = Some(id.to_string());
        self
    }

    /// Static edge; takes precedence over the phase router for `from`
    pub fn add_edge(mut self, from: &str, route: Route) -> Self {
        self.edges.insert(from.to_string(), route);
        self
    }

    /// Conditional edge: where to go when the state is in `phase`
    pub fn route(mut self, phase: P, route: Route) -> Self {
        self.routes.push((phase, route));
        self
    }

    /// Pause the run after `id` completes, before moving on to the next node
    pub fn interrupt_after(mut self, id: &str) -> Self {
        self.interrupts.insert(id.to_string());
        self
    }

    pub fn phase_field(mut self, field: &str) -> Self {
        self.phase_field = field.to_string();
        self
    }

    pub fn messages_field(mut self, field: &str) -> Self {
        self.messages_field = field.to_string();
        self
    }

    pub fn compile(self) -> Result<CompiledGraph<P>, ValidationError> {
        validate_schema(&self.schema)?;
        self.check_field(&self.phase_field, FieldType::String, ReducerType::Replace)?;
        self.check_field(&self.messages_field, FieldType::Array, ReducerType::Append)?;

        let mut nodes: HashMap<String, Arc<dyn Node>> = HashMap::new();
        for (id, node) in self.nodes {
            if nodes.insert(id.clone(), node).is_some() {
                return Err(ValidationError::DuplicateNode(id));
            }
        }

        let entry = self.entry.ok_or(ValidationError::MissingEntry)?;
        let resume = self.resume.ok_or(ValidationError::MissingResumeNode)?;
        for id in [&entry, &resume] {
            if !nodes.contains_key(id) {
                return Err(ValidationError::UnknownNode(id.clone()));
            }
        }

        for (from, route) in &self.edges {
            if !nodes.contains_key(from) {
                return Err(ValidationError::UnknownNode(from.clone()));
            }
            check_target(&nodes, route)?;
        }
        if let Some(id) = self.interrupts.iter().find(|id| !nodes.contains_key(*id)) {
            return Err(ValidationError::UnknownNode(id.clone()));
        }

        let mut router = PhaseRouter::new(self.phase_field);
        for (phase, route) in self.routes {
            check_target(&nodes, &route)?;
            router.insert(phase, route);
        }
        router.ensure_total()?;

        let schema = Arc::new(self.schema);

        // The phase a fresh run starts in has to be one the router knows
        let initial = WorkflowState::new(schema.clone());
        if !initial.get(router.field()).is_some_and(|v| v.is_null()) {
            router.phase_of(&initial)?;
        }

        log::info!(
            "Compiled graph '{}' with {} nodes (entry: {}, resume: {})",
            self.name,
            nodes.len(),
            entry,
            resume
        );

        Ok(CompiledGraph {
            name: self.name,
            schema,
            nodes,
            entry,
            resume,
            edges: self.edges,
            interrupts: self.interrupts,
            router,
            messages_field: self.messages_field,
        })
    }

    fn check_field(
        &self,
        field: &str,
        field_type: FieldType,
        reducer: ReducerType,
    ) -> Result<(), ValidationError> {
        let def = self
            .schema
            .get(field)
            .ok_or_else(|| ValidationError::UnknownField(field.to_string()))?;
        if def.field_type != field_type || def.reducer != reducer {
            return Err(ValidationError::FieldConfig {
                field: field.to_string(),
                reason: format!("expected {:?} with {:?} reducer", field_type, reducer),
            });
        }
        Ok(())
    }
}

/// Append needs an array, merge needs an object
fn validate_schema(schema: &StateSchema) -> Result<(), ValidationError> {
    for (name, def) in &schema.fields {
        let ok = match def.reducer {
            ReducerType::Replace => true,
            ReducerType::Append => def.field_type == FieldType::Array,
            ReducerType::Merge => def.field_type == FieldType::Object,
        };
        if !ok {
            return Err(ValidationError::FieldConfig {
                field: name.clone(),
                reason: format!("{:?} reducer on a {:?} field", def.reducer, def.field_type),
            });
        }
    }
    Ok(())
}

fn check_target(
    nodes: &HashMap<String, Arc<dyn Node>>,
    route: &Route,
) -> Result<(), ValidationError> {
    match route {
        Route::Goto(target) if !nodes.contains_key(target) => {
            Err(ValidationError::UnknownNode(target.clone()))
        }
        _ => Ok(()),
    }
}

/// A validated graph, ready to be driven by a [`GraphExecutor`](super::GraphExecutor)
pub struct CompiledGraph<P: Phase> {
    name: String,
    schema: Arc<StateSchema>,
    nodes: HashMap<String, Arc<dyn Node>>,
    entry: String,
    resume: String,
    edges: HashMap<String, Route>,
    interrupts: HashSet<String>,
    router: PhaseRouter<P>,
    messages_field: String,
}

impl<P: Phase> CompiledGraph<P> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<StateSchema> {
        &self.schema
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn resume(&self) -> &str {
        &self.resume
    }

    pub fn node(&self, id: &str) -> Option<&Arc<dyn Node>> {
        self.nodes.get(id)
    }

    pub fn router(&self) -> &PhaseRouter<P> {
        &self.router
    }

    pub fn phase_field(&self) -> &str {
        self.router.field()
    }

    pub fn messages_field(&self) -> &str {
        &self.messages_field
    }

    pub fn interrupts_after(&self, node: &str) -> bool {
        self.interrupts.contains(node)
    }

    /// Where to go after `node` produced `state`
    pub fn next_route(&self, node: &str, state: &WorkflowState) -> Result<Route, ValidationError> {
        if let Some(route) = self.edges.get(node) {
            return Ok(route.clone());
        }
        self.router.route(state).cloned()
    }
}
