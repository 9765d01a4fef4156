use slotmap::SlotMap;

use crate::api::behavior::{Behavior, Context};
use crate::api::types::{Capabilities, EntityId};
use crate::core::error::TreeError;
use crate::core::time::{ticks_from_seconds, FixedTimestep};
use crate::systems::collision::Collision;

/// A notification for one entity's behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hook {
    Start,
    Activate,
    Update,
    Deactivate,
    End,
    Collision(Collision),
}

impl Hook {
    fn call(self, behavior: &mut dyn Behavior, ctx: &mut Context<'_>) {
        match self {
            Hook::Start => behavior.on_start(ctx),
            Hook::Activate => behavior.on_activate(ctx),
            Hook::Update => behavior.on_update(ctx),
            Hook::Deactivate => behavior.on_deactivate(ctx),
            Hook::End => behavior.on_end(ctx),
            Hook::Collision(collision) => behavior.on_collision(ctx, &collision),
        }
    }
}

/// One entity in the arena.
struct Node {
    name: String,
    valid: bool,
    active: bool,
    started: bool,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    /// Cached at spawn so capability lookups still work while the behavior is detached.
    capabilities: Capabilities,
    /// `None` only while one of the behavior's own hooks is running.
    behavior: Option<Box<dyn Behavior>>,
    /// Hooks raised on this entity while its behavior was detached.
    deferred: Vec<Hook>,
}

/// Ownership tree of entities stored in a generational arena.
///
/// Parents exclusively own their children: destroying an entity destroys its
/// whole subtree. Entities that end during a traversal stay in the arena until
/// their parent has finished iterating its children, so no handle visited by
/// an in-progress pass is ever reclaimed under it.
pub struct Tree {
    nodes: SlotMap<EntityId, Node>,
    /// Shared tick length, 1.0 at 60 ticks per second.
    delta_time: f32,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            delta_time: 1.0,
        }
    }

    // -- Construction --

    /// Create a parentless entity.
    pub fn spawn(&mut self, name: impl Into<String>, behavior: impl Behavior) -> EntityId {
        self.spawn_boxed(name, Box::new(behavior))
    }

    pub fn spawn_boxed(
        &mut self,
        name: impl Into<String>,
        behavior: Box<dyn Behavior>,
    ) -> EntityId {
        let name = name.into();
        let capabilities = behavior.capabilities();
        let id = self.nodes.insert(Node {
            name,
            valid: true,
            active: true,
            started: false,
            parent: None,
            children: Vec::new(),
            capabilities,
            behavior: Some(behavior),
            deferred: Vec::new(),
        });
        log::debug!("Creating {} ({:?}), {} alive", self.nodes[id].name, id, self.nodes.len());
        id
    }

    /// Create an entity that failed to construct: present but already invalid.
    ///
    /// Parents reclaim it on their next pass like any ended entity.
    pub fn spawn_invalid(&mut self, name: impl Into<String>, behavior: impl Behavior) -> EntityId {
        let id = self.spawn(name, behavior);
        if let Some(node) = self.nodes.get_mut(id) {
            node.valid = false;
            node.active = false;
        }
        id
    }

    /// Create a child of `parent`, wired before anything can observe it.
    ///
    /// Returns `None` when `parent` does not exist.
    pub fn create_child(
        &mut self,
        parent: EntityId,
        name: impl Into<String>,
        behavior: impl Behavior,
    ) -> Option<EntityId> {
        self.create_child_boxed(parent, name, Box::new(behavior))
    }

    pub fn create_child_boxed(
        &mut self,
        parent: EntityId,
        name: impl Into<String>,
        behavior: Box<dyn Behavior>,
    ) -> Option<EntityId> {
        if !self.nodes.contains_key(parent) {
            log::warn!("create_child: unknown parent {:?}", parent);
            return None;
        }
        let id = self.spawn_boxed(name, behavior);
        self.nodes[id].parent = Some(parent);
        self.nodes[parent].children.push(id);
        Some(id)
    }

    // -- Ownership --

    /// Take ownership of `child`, detaching it from its previous owner.
    ///
    /// Adding an existing child again is a no-op.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<(), TreeError> {
        if parent == child {
            return Err(TreeError::SelfParent(child));
        }
        if !self.nodes.contains_key(parent) {
            return Err(TreeError::UnknownEntity(parent));
        }
        if !self.nodes.contains_key(child) {
            return Err(TreeError::UnknownEntity(child));
        }
        if self.has_ancestor(parent, child) {
            log::error!(
                "Refusing to attach {} under its descendant {}",
                self.nodes[child].name,
                self.nodes[parent].name
            );
            return Err(TreeError::Cycle { parent, child });
        }
        if self.nodes[parent].children.contains(&child) {
            return Ok(());
        }
        if let Some(old) = self.nodes[child].parent {
            if let Some(old_node) = self.nodes.get_mut(old) {
                old_node.children.retain(|&c| c != child);
            }
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// Release `child` from `parent`. The child survives as a root.
    ///
    /// Returns whether anything was removed.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        let Some(node) = self.nodes.get_mut(parent) else {
            return false;
        };
        let Some(index) = node.children.iter().position(|&c| c == child) else {
            return false;
        };
        node.children.remove(index);
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
        }
        true
    }

    /// Release the child at `index`. Out-of-range indices are ignored.
    pub fn remove_child_at(&mut self, parent: EntityId, index: usize) -> Option<EntityId> {
        let child = self.child_at(parent, index)?;
        self.remove_child(parent, child);
        Some(child)
    }

    // -- Navigation --

    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live entities in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn name(&self, id: EntityId) -> Option<&str> {
        self.nodes.get(id).map(|n| n.name.as_str())
    }

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Topmost ancestor, or `id` itself for a root.
    pub fn root(&self, id: EntityId) -> Option<EntityId> {
        if !self.contains(id) {
            return None;
        }
        let mut root = id;
        while let Some(p) = self.parent(root) {
            root = p;
        }
        Some(root)
    }

    /// Children in insertion order. Empty for unknown handles.
    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn child_at(&self, id: EntityId, index: usize) -> Option<EntityId> {
        self.children(id).get(index).copied()
    }

    pub fn index_of(&self, id: EntityId, child: EntityId) -> Option<usize> {
        self.children(id).iter().position(|&c| c == child)
    }

    pub fn last_child(&self, id: EntityId) -> Option<EntityId> {
        self.children(id).last().copied()
    }

    pub fn child_count(&self, id: EntityId) -> usize {
        self.children(id).len()
    }

    /// Number of ancestors above `id`.
    pub fn depth(&self, id: EntityId) -> usize {
        self.ancestors(id).count()
    }

    /// Ancestors from nearest to farthest.
    pub fn ancestors(&self, id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Whether `ancestor` is strictly above `id`.
    pub fn has_ancestor(&self, id: EntityId, ancestor: EntityId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    // -- State --

    pub fn is_valid(&self, id: EntityId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.valid)
    }

    /// Valid, flagged active, and every ancestor active too.
    pub fn is_active(&self, id: EntityId) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        if !node.valid || !node.active {
            return false;
        }
        match node.parent {
            Some(p) => self.is_active(p),
            None => true,
        }
    }

    /// The entity's own flag, ignoring ancestors.
    pub fn is_active_self(&self, id: EntityId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.valid && n.active)
    }

    pub fn is_started(&self, id: EntityId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.started)
    }

    pub fn capabilities(&self, id: EntityId) -> Capabilities {
        self.nodes.get(id).map(|n| n.capabilities).unwrap_or_default()
    }

    /// Tick length shared by every behavior, 1.0 at 60 ticks per second.
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn set_delta_time(&mut self, dt: f32) {
        self.delta_time = dt;
    }

    // -- Behavior access --

    pub fn behavior(&self, id: EntityId) -> Option<&dyn Behavior> {
        self.nodes.get(id).and_then(|n| n.behavior.as_deref())
    }

    pub fn behavior_mut(&mut self, id: EntityId) -> Option<&mut (dyn Behavior + 'static)> {
        self.nodes.get_mut(id)?.behavior.as_deref_mut()
    }

    /// Borrow the behavior of `id` as a concrete type.
    pub fn get<T: Behavior>(&self, id: EntityId) -> Option<&T> {
        self.behavior(id)?.as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: Behavior>(&mut self, id: EntityId) -> Option<&mut T> {
        self.behavior_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    /// Detach the behavior of `id`, run `f` with full tree access, reattach.
    ///
    /// Returns `None` if the entity is unknown or its behavior is already
    /// detached (re-entrant call from its own hook). Hooks raised on `id`
    /// meanwhile run in order once the behavior is back.
    pub fn with_behavior<R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut dyn Behavior, &mut Context<'_>) -> R,
    ) -> Option<R> {
        let mut behavior = self.nodes.get_mut(id)?.behavior.take()?;
        let result = {
            let mut ctx = Context::new(self, id);
            f(behavior.as_mut(), &mut ctx)
        };
        // The hook may have destroyed its own entity; the behavior then drops here.
        let deferred = match self.nodes.get_mut(id) {
            Some(node) => {
                node.behavior = Some(behavior);
                std::mem::take(&mut node.deferred)
            }
            None => Vec::new(),
        };
        for hook in deferred {
            self.notify(id, hook);
        }
        Some(result)
    }

    /// Deliver `hook` to the behavior of `id`.
    ///
    /// From inside one of that behavior's own hooks the call is queued and
    /// delivered as soon as the running hook returns.
    pub fn notify(&mut self, id: EntityId, hook: Hook) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.behavior.is_none() {
            // A re-entrant update is dropped rather than replayed.
            if hook != Hook::Update {
                node.deferred.push(hook);
            }
            return;
        }
        self.with_behavior(id, |b, ctx| hook.call(b, ctx));
    }

    // -- Update --

    /// Set the shared delta from wall-clock seconds and invoke `root`.
    pub fn tick(&mut self, root: EntityId, seconds: f32) {
        self.delta_time = ticks_from_seconds(seconds);
        self.invoke(root);
    }

    /// Run fixed ticks for `frame_seconds` of wall-clock time.
    ///
    /// The frame time goes through `timestep`, and `root` is invoked once per
    /// whole tick with the tick length as delta. Returns the ticks run.
    pub fn advance(
        &mut self,
        root: EntityId,
        frame_seconds: f32,
        timestep: &mut FixedTimestep,
    ) -> u32 {
        let steps = timestep.accumulate(frame_seconds);
        self.delta_time = timestep.tick_delta();
        for _ in 0..steps {
            if !self.is_active(root) {
                break;
            }
            self.invoke(root);
        }
        steps
    }

    /// Run one update pass over `id` and its subtree.
    ///
    /// Inactive entities are skipped entirely. Children run in insertion
    /// order over the live child list, so a child added during the pass is
    /// reached in the same pass. Those left invalid are destroyed once every
    /// child has run.
    pub fn invoke(&mut self, id: EntityId) {
        if !self.is_active(id) {
            return;
        }
        if !self.nodes[id].started {
            self.nodes[id].started = true;
            self.notify(id, Hook::Start);
            // Ending in on_start skips the rest of the pass.
            if !self.is_valid(id) {
                return;
            }
            self.notify(id, Hook::Activate);
        }
        if !self.is_active(id) {
            return;
        }
        self.notify(id, Hook::Update);

        let mut pending = Vec::new();
        let mut index = 0;
        while let Some(child) = self.child_at(id, index) {
            self.invoke(child);
            if !self.is_valid(child) {
                pending.push(child);
            }
            // Earlier siblings may have been removed meanwhile.
            index = match self.index_of(id, child) {
                Some(at) => at + 1,
                None => index,
            };
        }
        for child in pending {
            if self.parent(child) == Some(id) {
                self.destroy(child);
            }
        }
    }

    // -- Activation --

    pub fn set_active(&mut self, id: EntityId, active: bool) {
        if active {
            self.activate(id);
        } else {
            self.deactivate(id);
        }
    }

    /// Inactive → active. Fires `on_start` first if the entity never started.
    pub fn activate(&mut self, id: EntityId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.active || !node.valid {
            return;
        }
        node.active = true;
        self.trigger_activate(id);
    }

    /// Active → inactive. Notifications run while the entity is still active.
    pub fn deactivate(&mut self, id: EntityId) {
        match self.nodes.get(id) {
            Some(node) if node.active => {}
            _ => return,
        }
        self.trigger_deactivate(id);
        if let Some(node) = self.nodes.get_mut(id) {
            node.active = false;
        }
    }

    fn trigger_start(&mut self, id: EntityId) {
        if !self.is_active(id) {
            return;
        }
        for child in self.children(id).to_vec() {
            self.trigger_start(child);
        }
        let needs_start = match self.nodes.get_mut(id) {
            Some(node) if !node.started => {
                node.started = true;
                true
            }
            _ => false,
        };
        if needs_start {
            self.notify(id, Hook::Start);
        }
    }

    fn trigger_activate(&mut self, id: EntityId) {
        if !self.is_active(id) {
            return;
        }
        self.trigger_start(id);
        for child in self.children(id).to_vec() {
            self.trigger_activate(child);
        }
        self.notify(id, Hook::Activate);
    }

    fn trigger_deactivate(&mut self, id: EntityId) {
        if !self.is_active(id) {
            return;
        }
        for child in self.children(id).to_vec() {
            self.trigger_deactivate(child);
        }
        if self.is_started(id) {
            self.notify(id, Hook::Deactivate);
        }
    }

    // -- Teardown --

    /// Invalidate `id` and its subtree. Idempotent; memory is reclaimed later
    /// by the owning parent's update pass, or by [`Tree::destroy`].
    pub fn end(&mut self, id: EntityId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !node.valid {
            return;
        }
        if node.started && node.active {
            self.notify(id, Hook::Deactivate);
        }
        self.notify(id, Hook::End);
        for child in self.children(id).to_vec() {
            self.end(child);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.valid = false;
            node.active = false;
        }
    }

    /// End and immediately reclaim `id` with its whole subtree.
    pub fn destroy(&mut self, id: EntityId) {
        if !self.contains(id) {
            return;
        }
        self.end(id);
        if let Some(parent) = self.parent(id) {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|&c| c != id);
            }
        }
        self.reclaim(id);
        if self.nodes.is_empty() {
            log::debug!("All entities reclaimed");
        }
    }

    fn reclaim(&mut self, id: EntityId) {
        let Some(node) = self.nodes.remove(id) else {
            return;
        };
        log::debug!("Destroying {} ({:?}), {} alive", node.name, id, self.nodes.len());
        for child in node.children {
            self.reclaim(child);
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    /// Records every hook it receives.
    struct Recorder {
        tag: &'static str,
        journal: Journal,
    }

    impl Recorder {
        fn new(tag: &'static str, journal: &Journal) -> Self {
            Self { tag, journal: journal.clone() }
        }

        fn log(&self, event: &str) {
            self.journal.borrow_mut().push(format!("{}:{}", self.tag, event));
        }
    }

    impl Behavior for Recorder {
        fn on_start(&mut self, _ctx: &mut Context<'_>) {
            self.log("start");
        }
        fn on_activate(&mut self, _ctx: &mut Context<'_>) {
            self.log("activate");
        }
        fn on_update(&mut self, _ctx: &mut Context<'_>) {
            self.log("update");
        }
        fn on_deactivate(&mut self, _ctx: &mut Context<'_>) {
            self.log("deactivate");
        }
        fn on_end(&mut self, _ctx: &mut Context<'_>) {
            self.log("end");
        }
    }

    /// Ends itself on its first update.
    struct EndsItself;

    impl Behavior for EndsItself {
        fn on_update(&mut self, ctx: &mut Context<'_>) {
            ctx.end_self();
        }
    }

    /// Journals its own teardown, then ends itself from the given hook.
    struct Quitter {
        in_start: bool,
        journal: Journal,
    }

    impl Behavior for Quitter {
        fn on_start(&mut self, ctx: &mut Context<'_>) {
            self.journal.borrow_mut().push("start".into());
            if self.in_start {
                ctx.end_self();
            }
        }
        fn on_activate(&mut self, _ctx: &mut Context<'_>) {
            self.journal.borrow_mut().push("activate".into());
        }
        fn on_update(&mut self, ctx: &mut Context<'_>) {
            self.journal.borrow_mut().push("update".into());
            ctx.end_self();
        }
        fn on_deactivate(&mut self, _ctx: &mut Context<'_>) {
            self.journal.borrow_mut().push("deactivate".into());
        }
        fn on_end(&mut self, _ctx: &mut Context<'_>) {
            self.journal.borrow_mut().push("end".into());
        }
    }

    /// Adds a recording sibling the first time it updates.
    struct Spawner {
        journal: Journal,
    }

    impl Behavior for Spawner {
        fn on_update(&mut self, ctx: &mut Context<'_>) {
            if let Some(parent) = ctx.parent() {
                if ctx.tree.child_count(parent) == 1 {
                    ctx.tree.create_child(parent, "late", Recorder::new("late", &self.journal));
                }
            }
        }
    }

    /// Records what it can see of a sibling during its own update.
    struct Watcher {
        target: EntityId,
        seen: Rc<RefCell<Vec<(bool, bool)>>>,
    }

    impl Behavior for Watcher {
        fn on_update(&mut self, ctx: &mut Context<'_>) {
            let tree = &*ctx.tree;
            self.seen
                .borrow_mut()
                .push((tree.contains(self.target), tree.is_valid(self.target)));
        }
    }

    fn journal() -> Journal {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn create_child_wires_parent() {
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        let child = tree.create_child(root, "child", ()).unwrap();
        assert_eq!(tree.parent(child), Some(root));
        assert_eq!(tree.children(root), &[child]);
        assert_eq!(tree.name(child), Some("child"));
    }

    #[test]
    fn add_then_remove_clears_parent() {
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        let e = tree.spawn("e", ());
        tree.add_child(root, e).unwrap();
        assert!(tree.remove_child(root, e));
        assert_eq!(tree.parent(e), None);
        assert!(tree.children(root).is_empty());
        assert!(tree.contains(e));
    }

    #[test]
    fn add_child_twice_is_noop() {
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        let e = tree.spawn("e", ());
        tree.add_child(root, e).unwrap();
        tree.add_child(root, e).unwrap();
        assert_eq!(tree.child_count(root), 1);
    }

    #[test]
    fn reparent_moves_child() {
        let mut tree = Tree::new();
        let a = tree.spawn("a", ());
        let b = tree.spawn("b", ());
        let e = tree.create_child(a, "e", ()).unwrap();
        tree.add_child(b, e).unwrap();
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[e]);
        assert_eq!(tree.parent(e), Some(b));
    }

    #[test]
    fn rejects_cycles() {
        let mut tree = Tree::new();
        let a = tree.spawn("a", ());
        let b = tree.create_child(a, "b", ()).unwrap();
        let c = tree.create_child(b, "c", ()).unwrap();
        assert_eq!(tree.add_child(c, a), Err(TreeError::Cycle { parent: c, child: a }));
        assert_eq!(tree.add_child(a, a), Err(TreeError::SelfParent(a)));
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.children(c), &[] as &[EntityId]);
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        let child = tree.create_child(root, "child", ()).unwrap();
        assert_eq!(tree.remove_child_at(root, 3), None);
        assert_eq!(tree.remove_child_at(root, 0), Some(child));
        assert_eq!(tree.parent(child), None);
    }

    #[test]
    fn navigation_helpers() {
        let mut tree = Tree::new();
        let a = tree.spawn("a", ());
        let b = tree.create_child(a, "b", ()).unwrap();
        let c = tree.create_child(b, "c", ()).unwrap();
        let d = tree.create_child(b, "d", ()).unwrap();
        assert_eq!(tree.root(d), Some(a));
        assert_eq!(tree.depth(c), 2);
        assert_eq!(tree.index_of(b, d), Some(1));
        assert_eq!(tree.last_child(b), Some(d));
        assert!(tree.has_ancestor(c, a));
        assert!(!tree.has_ancestor(a, c));
    }

    #[test]
    fn first_invoke_starts_then_activates() {
        let j = journal();
        let mut tree = Tree::new();
        let root = tree.spawn("root", Recorder::new("r", &j));
        tree.create_child(root, "c", Recorder::new("c", &j)).unwrap();
        tree.invoke(root);
        tree.invoke(root);
        assert_eq!(
            *j.borrow(),
            vec![
                "r:start", "r:activate", "r:update", "c:start", "c:activate", "c:update",
                "r:update", "c:update",
            ]
        );
        assert!(tree.is_started(root));
    }

    #[test]
    fn inactive_entities_are_skipped() {
        let j = journal();
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        let c = tree.create_child(root, "c", Recorder::new("c", &j)).unwrap();
        tree.deactivate(c);
        tree.invoke(root);
        assert!(j.borrow().is_empty());
        assert!(!tree.is_started(c));
    }

    #[test]
    fn activation_transitions_fire_once() {
        let j = journal();
        let mut tree = Tree::new();
        let e = tree.spawn("e", Recorder::new("e", &j));
        tree.invoke(e);
        j.borrow_mut().clear();

        tree.activate(e);
        assert!(j.borrow().is_empty());

        tree.deactivate(e);
        tree.deactivate(e);
        tree.set_active(e, true);
        tree.set_active(e, true);
        assert_eq!(*j.borrow(), vec!["e:deactivate", "e:activate"]);
    }

    #[test]
    fn activation_starts_unstarted_entity_first() {
        let j = journal();
        let mut tree = Tree::new();
        let e = tree.spawn("e", Recorder::new("e", &j));
        tree.deactivate(e);
        tree.activate(e);
        assert_eq!(*j.borrow(), vec!["e:start", "e:activate"]);
        tree.invoke(e);
        assert_eq!(j.borrow().last().map(String::as_str), Some("e:update"));
        assert_eq!(j.borrow().iter().filter(|s| *s == "e:start").count(), 1);
    }

    #[test]
    fn parent_inactive_hides_children() {
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        let child = tree.create_child(root, "child", ()).unwrap();
        tree.deactivate(root);
        assert!(tree.is_active_self(child));
        assert!(!tree.is_active(child));
    }

    #[test]
    fn end_is_idempotent() {
        let j = journal();
        let mut tree = Tree::new();
        let root = tree.spawn("root", Recorder::new("r", &j));
        let child = tree.create_child(root, "c", Recorder::new("c", &j)).unwrap();
        tree.invoke(root);
        j.borrow_mut().clear();

        tree.end(root);
        let after_once = j.borrow().clone();
        tree.end(root);
        assert_eq!(*j.borrow(), after_once);
        assert_eq!(after_once, vec!["r:deactivate", "r:end", "c:deactivate", "c:end"]);
        assert!(!tree.is_valid(root));
        assert!(!tree.is_valid(child));
        assert!(!tree.is_active(root));
        assert!(tree.contains(child));
    }

    #[test]
    fn ended_entity_cannot_be_activated() {
        let mut tree = Tree::new();
        let e = tree.spawn("e", ());
        tree.end(e);
        tree.activate(e);
        assert!(!tree.is_active(e));
    }

    #[test]
    fn ended_child_reclaimed_on_parent_pass() {
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        let child = tree.create_child(root, "child", ()).unwrap();
        let grandchild = tree.create_child(child, "grandchild", ()).unwrap();
        tree.end(child);
        assert!(tree.contains(child));
        tree.invoke(root);
        assert!(!tree.contains(child));
        assert!(!tree.contains(grandchild));
        assert!(tree.children(root).is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn self_ending_child_survives_until_pass_completes() {
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        let doomed = tree.create_child(root, "doomed", EndsItself).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        tree.create_child(root, "watcher", Watcher { target: doomed, seen: seen.clone() })
            .unwrap();

        tree.invoke(root);

        // The later sibling still observed the ended entity in the same pass.
        assert_eq!(*seen.borrow(), vec![(true, false)]);
        assert!(!tree.contains(doomed));
        assert_eq!(tree.child_count(root), 1);

        tree.invoke(root);
        assert_eq!(*seen.borrow(), vec![(true, false), (false, false)]);
    }

    #[test]
    fn self_ending_entity_receives_teardown_hooks() {
        let j = journal();
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        let quitter = Quitter { in_start: false, journal: j.clone() };
        let q = tree.create_child(root, "quitter", quitter).unwrap();

        tree.invoke(root);
        assert_eq!(*j.borrow(), vec!["start", "activate", "update", "deactivate", "end"]);
        assert!(!tree.contains(q));
    }

    #[test]
    fn ending_in_start_skips_activate_and_update() {
        let j = journal();
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        let quitter = Quitter { in_start: true, journal: j.clone() };
        tree.create_child(root, "quitter", quitter).unwrap();

        tree.invoke(root);
        assert_eq!(*j.borrow(), vec!["start", "deactivate", "end"]);
        assert_eq!(tree.child_count(root), 0);
    }

    #[test]
    fn child_added_mid_pass_runs_in_same_pass() {
        let j = journal();
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        tree.create_child(root, "spawner", Spawner { journal: j.clone() }).unwrap();

        tree.invoke(root);
        assert_eq!(*j.borrow(), vec!["late:start", "late:activate", "late:update"]);
        assert_eq!(tree.child_count(root), 2);
    }

    #[test]
    fn advance_runs_whole_ticks() {
        let j = journal();
        let mut tree = Tree::new();
        let root = tree.spawn("root", Recorder::new("r", &j));
        let mut timestep = FixedTimestep::new(1.0 / 60.0);

        assert_eq!(tree.advance(root, 0.04, &mut timestep), 2);
        assert!((tree.delta_time() - 1.0).abs() < 1e-5);
        let updates = j.borrow().iter().filter(|s| *s == "r:update").count();
        assert_eq!(updates, 2);

        // The leftover 0.0067 s plus 0.012 s makes one more tick.
        assert_eq!(tree.advance(root, 0.012, &mut timestep), 1);
    }

    #[test]
    fn advance_stops_when_root_ends() {
        let j = journal();
        let mut tree = Tree::new();
        let root = tree.spawn("root", Quitter { in_start: false, journal: j.clone() });
        let mut timestep = FixedTimestep::default();
        tree.advance(root, 3.0 / 60.0 + 0.001, &mut timestep);
        assert_eq!(j.borrow().iter().filter(|s| *s == "update").count(), 1);
        assert!(!tree.is_valid(root));
    }

    #[test]
    fn invalid_construction_is_reclaimed() {
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        let broken = tree.spawn_invalid("broken", ());
        tree.add_child(root, broken).unwrap();
        assert!(!tree.is_active(broken));
        tree.invoke(root);
        assert!(!tree.contains(broken));
    }

    #[test]
    fn destroy_reclaims_subtree_and_detaches() {
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        let child = tree.create_child(root, "child", ()).unwrap();
        tree.create_child(child, "grandchild", ()).unwrap();
        tree.destroy(child);
        assert_eq!(tree.len(), 1);
        assert!(tree.children(root).is_empty());
        tree.destroy(root);
        assert!(tree.is_empty());
    }

    #[test]
    fn stale_handles_do_not_resolve() {
        let mut tree = Tree::new();
        let e = tree.spawn("e", ());
        tree.destroy(e);
        let f = tree.spawn("f", ());
        assert_ne!(e, f);
        assert!(!tree.contains(e));
        assert_eq!(tree.name(e), None);
    }

    #[test]
    fn tick_scales_delta_time() {
        let mut tree = Tree::new();
        let root = tree.spawn("root", ());
        tree.tick(root, 1.0 / 30.0);
        assert!((tree.delta_time() - 2.0).abs() < 1e-5);
    }
}
