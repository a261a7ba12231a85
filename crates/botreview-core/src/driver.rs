//! Host UI driver capability.
//!
//! The engine never touches a document directly. Everything it reads or
//! mutates goes through [`PageDriver`], which a browser backend (CDP) or an
//! in-memory fake implements.
//!
//! Elements are snapshots, not live handles: each carries an [`ElementPath`]
//! that the driver re-resolves against the current document on every action.
//! Holding an [`Element`] across a suspension point therefore never pins a
//! stale node, but the path may resolve to nothing (or to a different node)
//! once the host page has re-rendered. Callers re-query after every wait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::error::DriverError;
use crate::notify::Notification;

/// One step in an element path, resolved left to right from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PathStep {
    /// `scope.querySelectorAll(selector)[index]`.
    Select { selector: String, index: usize },
    /// `scope.parentElement`.
    Parent,
}

/// Re-resolvable address of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ElementPath(Vec<PathStep>);

impl ElementPath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn select(&self, selector: impl Into<String>, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Select {
            selector: selector.into(),
            index,
        });
        Self(steps)
    }

    pub fn parent(&self) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Parent);
        Self(steps)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Selector of the innermost `Select` step, for diagnostics.
    pub fn last_selector(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|step| match step {
            PathStep::Select { selector, .. } => Some(selector.as_str()),
            PathStep::Parent => None,
        })
    }
}

/// Snapshot of an element taken at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    path: ElementPath,
    pub tag: String,
    /// `textContent` at query time.
    pub text: String,
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    pub fn new(
        path: ElementPath,
        tag: impl Into<String>,
        text: impl Into<String>,
        attributes: BTreeMap<String, String>,
    ) -> Self {
        Self {
            path,
            tag: tag.into(),
            text: text.into(),
            attributes,
        }
    }

    pub fn path(&self) -> &ElementPath {
        &self.path
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Keys the workflow synthesizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    ShiftTab,
}

impl Key {
    pub fn key(self) -> &'static str {
        match self {
            Key::Enter => "Enter",
            Key::ShiftTab => "Tab",
        }
    }

    pub fn code(self) -> &'static str {
        self.key()
    }

    /// Legacy `keyCode` / `which` value.
    pub fn key_code(self) -> u32 {
        match self {
            Key::Enter => 13,
            Key::ShiftTab => 9,
        }
    }

    pub fn shift(self) -> bool {
        matches!(self, Key::ShiftTab)
    }
}

/// Synthetic DOM events. All of them bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticEvent {
    Input,
    KeyUp,
    KeyDown(Key),
    KeyPress(Key),
}

impl SyntheticEvent {
    pub fn event_type(self) -> &'static str {
        match self {
            SyntheticEvent::Input => "input",
            SyntheticEvent::KeyUp => "keyup",
            SyntheticEvent::KeyDown(_) => "keydown",
            SyntheticEvent::KeyPress(_) => "keypress",
        }
    }

    /// Keyboard payload, if this is a keyboard event carrying a key.
    pub fn key(self) -> Option<Key> {
        match self {
            SyntheticEvent::KeyDown(key) | SyntheticEvent::KeyPress(key) => Some(key),
            SyntheticEvent::Input | SyntheticEvent::KeyUp => None,
        }
    }
}

/// Where a synthetic event is dispatched.
#[derive(Debug, Clone, Copy)]
pub enum EventTarget<'a> {
    Element(&'a Element),
    /// `document.activeElement`, falling back to the body.
    Focused,
}

/// How a click is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickStyle {
    /// `element.click()` only.
    Direct,
    /// A dispatched bubbling, cancelable `MouseEvent("click")` followed by
    /// `element.click()`. Only for clicks whose repetition is harmless.
    DispatchAndDirect,
}

/// Host UI driver.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Current document location.
    async fn location(&self) -> Result<Url, DriverError>;

    /// All elements matching `selector`, inside `scope` or the whole document.
    async fn query_all(
        &self,
        scope: Option<&Element>,
        selector: &str,
    ) -> Result<Vec<Element>, DriverError>;

    /// The parent element, if the element is still attached and has one.
    async fn parent(&self, element: &Element) -> Result<Option<Element>, DriverError>;

    async fn click(&self, element: &Element, style: ClickStyle) -> Result<(), DriverError>;

    /// Focus the element and assign its `value`.
    async fn set_value(&self, element: &Element, value: &str) -> Result<(), DriverError>;

    async fn dispatch(
        &self,
        target: EventTarget<'_>,
        event: SyntheticEvent,
    ) -> Result<(), DriverError>;

    /// Navigate and wait until the new document is interactive.
    async fn navigate(&self, url: &Url) -> Result<(), DriverError>;

    /// Render a transient overlay that removes itself after its TTL.
    async fn show_notification(&self, notification: &Notification) -> Result<(), DriverError>;

    /// First element matching `selector`.
    async fn query(
        &self,
        scope: Option<&Element>,
        selector: &str,
    ) -> Result<Option<Element>, DriverError> {
        Ok(self.query_all(scope, selector).await?.into_iter().next())
    }
}
