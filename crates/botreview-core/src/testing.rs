//! In-memory [`PageDriver`] for engine tests.
//!
//! The fake does not parse CSS. Elements are registered under the exact
//! selector strings the engine queries, optionally inside a scope element,
//! and every mutating call is recorded for assertions.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use crate::driver::{ClickStyle, Element, ElementPath, EventTarget, PageDriver, PathStep, SyntheticEvent};
use crate::error::DriverError;
use crate::notify::Notification;

pub(crate) type NodeId = usize;

#[derive(Debug, Clone)]
pub(crate) struct FakeNode {
    tag: String,
    text: String,
    attributes: BTreeMap<String, String>,
}

impl FakeNode {
    pub(crate) fn new(tag: &str, text: &str) -> Self {
        Self {
            tag: tag.to_string(),
            text: text.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    pub(crate) fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

/// Recorded interaction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    Click { selector: String, style: ClickStyle },
    SetValue { selector: String, value: String },
    Dispatch { target: String, event: SyntheticEvent },
    Navigate(String),
    Notify(Notification),
}

impl Action {
    fn is_mutation(&self) -> bool {
        !matches!(self, Action::Notify(_))
    }
}

/// Side effect applied when an element registered under a selector is clicked.
#[derive(Debug, Clone)]
pub(crate) enum Reaction {
    SetUrl(String),
    Insert(String, FakeNode),
}

#[derive(Default)]
struct State {
    url: Option<Url>,
    nodes: Vec<FakeNode>,
    matches: HashMap<(Option<NodeId>, String), Vec<NodeId>>,
    parents: HashMap<NodeId, NodeId>,
    hidden: HashMap<String, u32>,
    failing: Vec<String>,
    query_counts: HashMap<String, u32>,
    reactions: HashMap<String, Vec<Reaction>>,
    actions: Vec<Action>,
}

impl State {
    fn add(&mut self, node: FakeNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn register(&mut self, scope: Option<NodeId>, selector: &str, id: NodeId) {
        self.matches
            .entry((scope, selector.to_string()))
            .or_default()
            .push(id);
    }

    fn resolve(&self, path: &ElementPath) -> Result<NodeId, DriverError> {
        let mut current: Option<NodeId> = None;
        for step in path.steps() {
            current = Some(match step {
                PathStep::Select { selector, index } => self
                    .matches
                    .get(&(current, selector.clone()))
                    .and_then(|ids| ids.get(*index))
                    .copied()
                    .ok_or_else(|| DriverError::Detached(selector.clone()))?,
                PathStep::Parent => current
                    .and_then(|id| self.parents.get(&id))
                    .copied()
                    .ok_or_else(|| DriverError::Detached("parent".to_string()))?,
            });
        }
        current.ok_or_else(|| DriverError::Detached("document".to_string()))
    }

    fn snapshot(&self, path: ElementPath, id: NodeId) -> Element {
        let node = &self.nodes[id];
        Element::new(path, &node.tag, &node.text, node.attributes.clone())
    }

    fn apply(&mut self, reaction: Reaction) {
        match reaction {
            Reaction::SetUrl(url) => self.url = Url::parse(&url).ok(),
            Reaction::Insert(selector, node) => {
                let id = self.add(node);
                self.register(None, &selector, id);
            }
        }
    }
}

pub(crate) struct FakePage {
    state: Mutex<State>,
}

impl FakePage {
    pub(crate) fn new(url: &str) -> Self {
        let state = State {
            url: Some(Url::parse(url).expect("valid test url")),
            ..State::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Add a node that matches no selector on its own.
    pub(crate) fn add(&self, node: FakeNode) -> NodeId {
        self.state.lock().add(node)
    }

    /// Add a node matching `selector` at document level.
    pub(crate) fn insert(&self, selector: &str, node: FakeNode) -> NodeId {
        let mut state = self.state.lock();
        let id = state.add(node);
        state.register(None, selector, id);
        id
    }

    /// Add a node matching `selector` inside `scope`, with `scope` as its parent.
    pub(crate) fn insert_within(&self, scope: NodeId, selector: &str, node: FakeNode) -> NodeId {
        let mut state = self.state.lock();
        let id = state.add(node);
        state.register(Some(scope), selector, id);
        state.parents.insert(id, scope);
        id
    }

    pub(crate) fn set_parent(&self, child: NodeId, parent: NodeId) {
        self.state.lock().parents.insert(child, parent);
    }

    /// Report no matches for the first `queries` lookups of `selector`.
    pub(crate) fn reveal_after(&self, selector: &str, queries: u32) {
        self.state.lock().hidden.insert(selector.to_string(), queries);
    }

    /// Make every lookup of `selector` fail with a script error.
    pub(crate) fn fail_queries(&self, selector: &str) {
        self.state.lock().failing.push(selector.to_string());
    }

    pub(crate) fn on_click(&self, selector: &str, reaction: Reaction) {
        self.state
            .lock()
            .reactions
            .entry(selector.to_string())
            .or_default()
            .push(reaction);
    }

    pub(crate) fn url(&self) -> String {
        self.state
            .lock()
            .url
            .as_ref()
            .map(Url::to_string)
            .unwrap_or_default()
    }

    pub(crate) fn query_count(&self, selector: &str) -> u32 {
        self.state
            .lock()
            .query_counts
            .get(selector)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn actions(&self) -> Vec<Action> {
        self.state.lock().actions.clone()
    }

    /// Recorded actions that change the document.
    pub(crate) fn mutations(&self) -> Vec<Action> {
        self.actions().into_iter().filter(Action::is_mutation).collect()
    }

    pub(crate) fn clicks(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Click { selector, .. } => Some(selector),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn notifications(&self) -> Vec<Notification> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Notify(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn label(element: &Element) -> String {
        element.path().last_selector().unwrap_or("?").to_string()
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn location(&self) -> Result<Url, DriverError> {
        self.state
            .lock()
            .url
            .clone()
            .ok_or_else(|| DriverError::InvalidLocation("unset".to_string()))
    }

    async fn query_all(
        &self,
        scope: Option<&Element>,
        selector: &str,
    ) -> Result<Vec<Element>, DriverError> {
        let mut state = self.state.lock();
        *state.query_counts.entry(selector.to_string()).or_default() += 1;

        if state.failing.iter().any(|s| s == selector) {
            return Err(DriverError::Script(format!("query failed: {}", selector)));
        }
        if let Some(remaining) = state.hidden.get_mut(selector) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(Vec::new());
            }
        }

        let (scope_id, base) = match scope {
            Some(el) => (Some(state.resolve(el.path())?), el.path().clone()),
            None => (None, ElementPath::root()),
        };

        let ids = state
            .matches
            .get(&(scope_id, selector.to_string()))
            .cloned()
            .unwrap_or_default();

        Ok(ids
            .into_iter()
            .enumerate()
            .map(|(index, id)| state.snapshot(base.select(selector, index), id))
            .collect())
    }

    async fn parent(&self, element: &Element) -> Result<Option<Element>, DriverError> {
        let state = self.state.lock();
        let id = state.resolve(element.path())?;
        Ok(state
            .parents
            .get(&id)
            .map(|&parent| state.snapshot(element.path().parent(), parent)))
    }

    async fn click(&self, element: &Element, style: ClickStyle) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.resolve(element.path())?;

        let selector = Self::label(element);
        state.actions.push(Action::Click {
            selector: selector.clone(),
            style,
        });

        if let Some(reactions) = state.reactions.get(&selector).cloned() {
            for reaction in reactions {
                state.apply(reaction);
            }
        }
        Ok(())
    }

    async fn set_value(&self, element: &Element, value: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.resolve(element.path())?;
        state.actions.push(Action::SetValue {
            selector: Self::label(element),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn dispatch(
        &self,
        target: EventTarget<'_>,
        event: SyntheticEvent,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let target = match target {
            EventTarget::Element(el) => {
                state.resolve(el.path())?;
                Self::label(el)
            }
            EventTarget::Focused => "<focused>".to_string(),
        };
        state.actions.push(Action::Dispatch { target, event });
        Ok(())
    }

    async fn navigate(&self, url: &Url) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.actions.push(Action::Navigate(url.to_string()));
        state.url = Some(url.clone());
        Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), DriverError> {
        self.state
            .lock()
            .actions
            .push(Action::Notify(notification.clone()));
        Ok(())
    }
}
