//! Mutually exclusive application states (menu, play, pause, ...).
//!
//! A [`StateManager`] entity owns its states as children. States are any
//! behavior reporting `Capabilities::STATE`; [`State`] is the plain one.
//! Manipulation goes through [`Tree::states`], which borrows the tree.

use crate::api::behavior::Behavior;
use crate::api::types::{Capabilities, EntityId};
use crate::core::tree::Tree;
use crate::systems::debug::Inspector;

/// A named state with no logic of its own. Game logic lives in its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    name: String,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl Behavior for State {
    fn capabilities(&self) -> Capabilities {
        Capabilities::STATE
    }

    fn state_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn describe(&self, inspector: &mut Inspector) {
        inspector.field("State", &self.name);
    }
}

/// Owner of a set of states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateManager {
    current: Option<EntityId>,
}

impl StateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The state last selected with `set_current_state`, if any.
    pub fn current(&self) -> Option<EntityId> {
        self.current
    }
}

impl Behavior for StateManager {
    fn capabilities(&self) -> Capabilities {
        Capabilities::STATE_MANAGER
    }

    fn describe(&self, inspector: &mut Inspector) {
        inspector.field("Current", format!("{:?}", self.current));
    }
}

/// How to address a state: position among the states, handle, or name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRef<'a> {
    Index(usize),
    Id(EntityId),
    Name(&'a str),
}

impl From<usize> for StateRef<'_> {
    fn from(i: usize) -> Self {
        StateRef::Index(i)
    }
}

impl From<EntityId> for StateRef<'_> {
    fn from(id: EntityId) -> Self {
        StateRef::Id(id)
    }
}

impl<'a> From<&'a str> for StateRef<'a> {
    fn from(name: &'a str) -> Self {
        StateRef::Name(name)
    }
}

impl Tree {
    /// State operations on `manager`; `None` unless it is a state manager.
    pub fn states(&mut self, manager: EntityId) -> Option<States<'_>> {
        if !self.has_capabilities(manager, Capabilities::STATE_MANAGER) {
            return None;
        }
        Some(States { tree: self, manager })
    }

    /// Name a state answers to: its behavior's state name, else the entity name.
    pub fn state_name(&self, id: EntityId) -> Option<&str> {
        match self.behavior(id).and_then(|b| b.state_name()) {
            Some(name) => Some(name),
            None => self.name(id),
        }
    }
}

/// A state manager borrowed together with its tree.
pub struct States<'a> {
    tree: &'a mut Tree,
    manager: EntityId,
}

impl<'a> States<'a> {
    pub fn manager(&self) -> EntityId {
        self.manager
    }

    /// Valid state children, in insertion order.
    pub fn states(&self) -> Vec<EntityId> {
        self.tree
            .find_children_with(self.manager, Capabilities::STATE)
            .into_iter()
            .filter(|&s| self.tree.is_valid(s))
            .collect()
    }

    fn matches(&self, state: StateRef<'_>) -> Vec<EntityId> {
        let states = self.states();
        match state {
            StateRef::Index(i) => states.get(i).copied().into_iter().collect(),
            StateRef::Id(id) => states.into_iter().filter(|&s| s == id).collect(),
            StateRef::Name(name) => states
                .into_iter()
                .filter(|&s| self.tree.state_name(s) == Some(name))
                .collect(),
        }
    }

    /// First state matching `state`.
    pub fn get_state<'r>(&self, state: impl Into<StateRef<'r>>) -> Option<EntityId> {
        self.matches(state.into()).into_iter().next()
    }

    /// The state last selected with `set_current_state`, if it is still loaded.
    pub fn current_state(&self) -> Option<EntityId> {
        let current = self.tree.get::<StateManager>(self.manager)?.current?;
        self.tree.is_valid(current).then_some(current)
    }

    /// Add `behavior` as a new state named `name`.
    ///
    /// Returns `None` and inserts nothing unless the behavior reports
    /// `Capabilities::STATE`.
    pub fn load_state<B: Behavior>(
        &mut self,
        name: impl Into<String>,
        behavior: B,
        active: bool,
    ) -> Option<EntityId> {
        let name = name.into();
        if !behavior.capabilities().contains(Capabilities::STATE) {
            log::warn!("{} is not a state and was not loaded", name);
            return None;
        }
        let id = self.tree.create_child(self.manager, name, behavior)?;
        if !active {
            self.tree.deactivate(id);
        }
        Some(id)
    }

    /// End every state matching `state`; the manager reclaims them on its
    /// next update.
    pub fn unload_state<'r>(&mut self, state: impl Into<StateRef<'r>>) -> bool {
        let found = self.matches(state.into());
        for &s in &found {
            self.tree.end(s);
        }
        !found.is_empty()
    }

    pub fn unload_all_states(&mut self) {
        for s in self.states() {
            self.tree.end(s);
        }
    }

    /// Activate the match and deactivate every other state.
    ///
    /// Nothing changes when no state matches.
    pub fn set_current_state<'r>(&mut self, state: impl Into<StateRef<'r>>) -> bool {
        let Some(target) = self.get_state(state) else {
            return false;
        };
        for s in self.states() {
            if s != target {
                self.tree.deactivate(s);
            }
        }
        self.tree.activate(target);
        if let Some(manager) = self.tree.get_mut::<StateManager>(self.manager) {
            manager.current = Some(target);
        }
        log::debug!(
            "Current state: {}",
            self.tree.state_name(target).unwrap_or_default()
        );
        true
    }

    pub fn activate_state<'r>(&mut self, state: impl Into<StateRef<'r>>) -> bool {
        let Some(target) = self.get_state(state) else {
            return false;
        };
        self.tree.activate(target);
        true
    }

    pub fn deactivate_state<'r>(&mut self, state: impl Into<StateRef<'r>>) -> bool {
        let Some(target) = self.get_state(state) else {
            return false;
        };
        self.tree.deactivate(target);
        true
    }
}
