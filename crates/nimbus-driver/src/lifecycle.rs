//! Resource lifecycle state machines
//!
//! A [`Lifecycle`] is a validated transition table. It never runs anything
//! on its own: the backend reports the state it observed, and the machine is
//! used to validate that state and to work out which actions a caller may
//! invoke next.
//!
//! ```text
//!   start ──auto──▶ pending ──auto──▶ running ──stop──▶ stopping ──auto──▶ stopped
//! ```

use crate::error::{RegistrationError, Result, UniformError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// What fires a transition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Happens on its own once the source state is observed
    Automatic,
    /// Happens only when a caller invokes the named action
    Action(String),
}

/// A single edge of the transition table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub trigger: Trigger,
}

impl Transition {
    pub fn automatic(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            trigger: Trigger::Automatic,
        }
    }

    pub fn on(from: impl Into<String>, to: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            trigger: Trigger::Action(action.into()),
        }
    }

    pub fn is_automatic(&self) -> bool {
        matches!(self.trigger, Trigger::Automatic)
    }

    /// Action name for action-triggered transitions
    pub fn action(&self) -> Option<&str> {
        match &self.trigger {
            Trigger::Action(name) => Some(name),
            Trigger::Automatic => None,
        }
    }
}

/// Collects states and transitions before validation
#[derive(Debug, Clone, Default)]
pub struct LifecycleBuilder {
    initial: Option<String>,
    terminal: Vec<String>,
    transitions: Vec<Transition>,
}

impl LifecycleBuilder {
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    pub fn terminal(mut self, state: impl Into<String>) -> Self {
        self.terminal.push(state.into());
        self
    }

    pub fn transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn automatic(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.transition(Transition::automatic(from, to))
    }

    pub fn on(
        self,
        from: impl Into<String>,
        to: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        self.transition(Transition::on(from, to, action))
    }

    /// Validate the table and freeze it into a [`Lifecycle`]
    pub fn build(self) -> std::result::Result<Lifecycle, RegistrationError> {
        let invalid = |msg: String| RegistrationError::InvalidMachine(msg);

        let initial = self
            .initial
            .ok_or_else(|| invalid("no initial state designated".to_string()))?;
        if self.terminal.is_empty() {
            return Err(invalid("no terminal state designated".to_string()));
        }
        let terminal: BTreeSet<String> = self.terminal.into_iter().collect();
        if terminal.contains(&initial) {
            return Err(invalid(format!("initial state {} cannot be terminal", initial)));
        }

        let mut states = vec![initial.clone()];
        let mut push_state = |name: &str| {
            if !states.iter().any(|s| s == name) {
                states.push(name.to_string());
            }
        };
        for t in &self.transitions {
            push_state(&t.from);
            push_state(&t.to);
        }
        for name in &terminal {
            push_state(name);
        }
        if states.iter().any(|s| s.trim().is_empty()) {
            return Err(invalid("state names must not be empty".to_string()));
        }

        let mut automatic_sources = HashSet::new();
        let mut action_edges = HashSet::new();
        for t in &self.transitions {
            match &t.trigger {
                Trigger::Automatic => {
                    if !automatic_sources.insert(t.from.as_str()) {
                        return Err(invalid(format!(
                            "state {} has more than one automatic transition",
                            t.from
                        )));
                    }
                    if terminal.contains(&t.from) {
                        return Err(invalid(format!(
                            "terminal state {} has an automatic transition",
                            t.from
                        )));
                    }
                }
                Trigger::Action(action) => {
                    if action.trim().is_empty() {
                        return Err(invalid(format!("state {} has an unnamed action", t.from)));
                    }
                    if !action_edges.insert((t.from.as_str(), action.as_str())) {
                        return Err(invalid(format!(
                            "action {} is declared twice from state {}",
                            action, t.from
                        )));
                    }
                }
            }
        }

        let reachable = reachable_from(&initial, &self.transitions);
        for state in &states {
            if terminal.contains(state) {
                continue;
            }
            if !self.transitions.iter().any(|t| &t.from == state) {
                return Err(invalid(format!(
                    "non-terminal state {} has no outgoing transition",
                    state
                )));
            }
            if !reachable.contains(state.as_str()) && !automatic_sources.contains(state.as_str())
            {
                return Err(invalid(format!(
                    "state {} is unreachable from {} and never advances automatically",
                    state, initial
                )));
            }
        }

        tracing::debug!(
            "Built lifecycle with {} states and {} transitions",
            states.len(),
            self.transitions.len()
        );

        Ok(Lifecycle {
            initial,
            terminal,
            states,
            transitions: self.transitions,
        })
    }
}

fn reachable_from<'a>(initial: &'a str, transitions: &'a [Transition]) -> HashSet<&'a str> {
    let mut seen = HashSet::from([initial]);
    let mut queue = VecDeque::from([initial]);
    while let Some(state) = queue.pop_front() {
        for t in transitions.iter().filter(|t| t.from == state) {
            if seen.insert(t.to.as_str()) {
                queue.push_back(t.to.as_str());
            }
        }
    }
    seen
}

/// A validated, immutable lifecycle state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    initial: String,
    terminal: BTreeSet<String>,
    states: Vec<String>,
    transitions: Vec<Transition>,
}

impl Lifecycle {
    pub fn builder() -> LifecycleBuilder {
        LifecycleBuilder::default()
    }

    pub fn initial(&self) -> &str {
        &self.initial
    }

    pub fn is_terminal(&self, state: &str) -> bool {
        self.terminal.contains(state)
    }

    /// Every state, initial first, then in order of first mention
    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn contains(&self, state: &str) -> bool {
        self.states.iter().any(|s| s == state)
    }

    /// Map a backend-reported state onto its declared spelling
    pub fn resolve(&self, observed: &str) -> Option<&str> {
        self.states
            .iter()
            .find(|s| s.eq_ignore_ascii_case(observed.trim()))
            .map(String::as_str)
    }

    /// Actions of the action-triggered transitions leaving `state`
    pub fn legal_actions(&self, state: &str) -> Vec<&str> {
        let mut actions: Vec<&str> = Vec::new();
        for action in self
            .transitions
            .iter()
            .filter(|t| t.from == state)
            .filter_map(Transition::action)
        {
            if !actions.contains(&action) {
                actions.push(action);
            }
        }
        actions
    }

    /// Destination of `action` from `state`
    pub fn apply(&self, state: &str, action: &str) -> Result<&str> {
        self.transitions
            .iter()
            .find(|t| t.from == state && t.action() == Some(action))
            .map(|t| t.to.as_str())
            .ok_or_else(|| {
                tracing::warn!("Rejected action {} in state {}", action, state);
                UniformError::illegal_transition(state, action)
            })
    }

    /// Destination of the automatic transition leaving `state`, or `state`
    pub fn advance_automatic<'a>(&'a self, state: &'a str) -> &'a str {
        self.transitions
            .iter()
            .find(|t| t.from == state && t.is_automatic())
            .map(|t| t.to.as_str())
            .unwrap_or(state)
    }

    /// Follow automatic transitions until none applies
    pub fn settle<'a>(&'a self, state: &'a str) -> &'a str {
        let mut current = state;
        // an automatic cycle can never be longer than the state list
        for _ in 0..self.states.len() {
            let next = self.advance_automatic(current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// Per-state summary for the front end's state document
    pub fn describe(&self) -> Vec<StateInfo> {
        self.states
            .iter()
            .map(|name| StateInfo {
                name: name.clone(),
                initial: *name == self.initial,
                terminal: self.is_terminal(name),
                transitions: self
                    .transitions
                    .iter()
                    .filter(|t| &t.from == name)
                    .map(|t| TransitionInfo {
                        to: t.to.clone(),
                        action: t.action().map(str::to_string),
                        automatic: t.is_automatic(),
                    })
                    .collect(),
            })
            .collect()
    }
}

/// A state and its outgoing transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInfo {
    pub name: String,
    pub initial: bool,
    pub terminal: bool,
    pub transitions: Vec<TransitionInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionInfo {
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub automatic: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn machine() -> Lifecycle {
        Lifecycle::builder()
            .initial("start")
            .terminal("stopped")
            .automatic("start", "pending")
            .automatic("pending", "running")
            .on("running", "stopping", "stop")
            .automatic("stopping", "stopped")
            .build()
            .unwrap()
    }

    fn invalid(builder: LifecycleBuilder) -> String {
        match builder.build() {
            Err(RegistrationError::InvalidMachine(msg)) => msg,
            other => panic!("expected InvalidMachine, got {:?}", other),
        }
    }

    #[test]
    fn test_scenario() {
        let machine = machine();
        assert_eq!(machine.legal_actions("running"), vec!["stop"]);
        let err = machine.apply("running", "reboot").unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalTransition);
        assert_eq!(err.status, 405);
        assert_eq!(machine.advance_automatic("stopping"), "stopped");
    }

    #[test]
    fn test_states_in_declaration_order() {
        let machine = machine();
        assert_eq!(
            machine.states(),
            &["start", "pending", "running", "stopping", "stopped"]
        );
        assert_eq!(machine.initial(), "start");
        assert!(machine.is_terminal("stopped"));
        assert!(!machine.is_terminal("running"));
    }

    #[test]
    fn test_apply_returns_declared_destination() {
        let machine = machine();
        for t in machine.transitions() {
            if let Some(action) = t.action() {
                assert_eq!(machine.apply(&t.from, action).unwrap(), t.to);
            }
        }
        for state in machine.states() {
            if state != "running" {
                assert!(machine.apply(state, "stop").is_err());
            }
        }
    }

    #[test]
    fn test_advance_without_automatic_is_noop() {
        let machine = machine();
        assert_eq!(machine.advance_automatic("running"), "running");
        assert_eq!(machine.advance_automatic("stopped"), "stopped");
        assert_eq!(machine.advance_automatic("unknown"), "unknown");
        assert_eq!(machine.advance_automatic("start"), "pending");
    }

    #[test]
    fn test_legal_actions_only_from_queried_state() {
        let machine = Lifecycle::builder()
            .initial("start")
            .terminal("finish")
            .automatic("start", "running")
            .on("running", "running", "reboot")
            .on("running", "stopped", "stop")
            .on("stopped", "running", "start")
            .on("stopped", "finish", "destroy")
            .build()
            .unwrap();

        for state in machine.states() {
            for action in machine.legal_actions(state) {
                assert!(machine
                    .transitions()
                    .iter()
                    .any(|t| &t.from == state && t.action() == Some(action)));
            }
        }
        assert_eq!(machine.legal_actions("running"), vec!["reboot", "stop"]);
        assert_eq!(machine.legal_actions("stopped"), vec!["start", "destroy"]);
        assert!(machine.legal_actions("start").is_empty());
    }

    #[test]
    fn test_same_action_from_several_states() {
        let machine = Lifecycle::builder()
            .initial("start")
            .terminal("finish")
            .on("start", "running", "boot")
            .on("running", "finish", "destroy")
            .on("start", "finish", "destroy")
            .build()
            .unwrap();
        assert_eq!(machine.apply("start", "destroy").unwrap(), "finish");
        assert_eq!(machine.apply("running", "destroy").unwrap(), "finish");
    }

    #[test]
    fn test_rejects_two_automatic_transitions() {
        let msg = invalid(
            Lifecycle::builder()
                .initial("start")
                .terminal("stopped")
                .automatic("start", "pending")
                .automatic("pending", "running")
                .automatic("pending", "stopped")
                .on("running", "stopped", "stop"),
        );
        assert!(msg.contains("pending"));
    }

    #[test]
    fn test_rejects_dead_end_state() {
        let msg = invalid(
            Lifecycle::builder()
                .initial("start")
                .terminal("stopped")
                .automatic("start", "running")
                .on("start", "stopped", "abort"),
        );
        assert!(msg.contains("running"));
    }

    #[test]
    fn test_rejects_unreachable_state() {
        let msg = invalid(
            Lifecycle::builder()
                .initial("start")
                .terminal("stopped")
                .automatic("start", "stopped")
                .on("orphan", "stopped", "stop"),
        );
        assert!(msg.contains("orphan"));
    }

    #[test]
    fn test_unreachable_state_with_automatic_transition_allowed() {
        let machine = Lifecycle::builder()
            .initial("start")
            .terminal("stopped")
            .automatic("start", "stopped")
            .automatic("shutting-down", "stopped")
            .build()
            .unwrap();
        assert_eq!(machine.advance_automatic("shutting-down"), "stopped");
    }

    #[test]
    fn test_rejects_missing_designations() {
        invalid(Lifecycle::builder().terminal("stopped").automatic("start", "stopped"));
        invalid(Lifecycle::builder().initial("start").automatic("start", "stopped"));
    }

    #[test]
    fn test_rejects_automatic_transition_out_of_terminal() {
        let msg = invalid(
            Lifecycle::builder()
                .initial("start")
                .terminal("stopped")
                .automatic("start", "stopped")
                .automatic("stopped", "start"),
        );
        assert!(msg.contains("terminal state stopped"));
    }

    #[test]
    fn test_rejects_empty_state_name() {
        let msg = invalid(
            Lifecycle::builder()
                .initial("start")
                .terminal("stopped")
                .automatic("start", " ")
                .on(" ", "stopped", "stop"),
        );
        assert!(msg.contains("empty"));
    }

    #[test]
    fn test_rejects_unnamed_action() {
        let msg = invalid(
            Lifecycle::builder()
                .initial("start")
                .terminal("stopped")
                .on("start", "stopped", ""),
        );
        assert!(msg.contains("unnamed action"));
    }

    #[test]
    fn test_rejects_duplicate_action_edge() {
        invalid(
            Lifecycle::builder()
                .initial("start")
                .terminal("a")
                .terminal("b")
                .on("start", "a", "go")
                .on("start", "b", "go"),
        );
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let machine = machine();
        assert_eq!(machine.resolve("RUNNING"), Some("running"));
        assert_eq!(machine.resolve(" Stopped "), Some("stopped"));
        assert_eq!(machine.resolve("rebooting"), None);
    }

    #[test]
    fn test_settle_follows_automatic_chain() {
        let machine = machine();
        assert_eq!(machine.settle("start"), "running");
        assert_eq!(machine.settle("stopping"), "stopped");
        assert_eq!(machine.settle("running"), "running");
    }

    #[test]
    fn test_describe() {
        let info = machine().describe();
        assert_eq!(info.len(), 5);
        assert!(info[0].initial);
        let running = info.iter().find(|s| s.name == "running").unwrap();
        assert_eq!(running.transitions.len(), 1);
        assert_eq!(running.transitions[0].action.as_deref(), Some("stop"));
        assert!(info.iter().find(|s| s.name == "stopped").unwrap().terminal);
    }
}
