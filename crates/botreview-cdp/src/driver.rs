//! [`PageDriver`] over a CDP page session.

use async_trait::async_trait;
use botreview_core::{
    ClickStyle, DriverError, Element, ElementPath, EventTarget, Notification, PageDriver,
    SyntheticEvent,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::trace;
use url::Url;

use crate::error::CdpError;
use crate::script::{self, ElementSnapshot, Reply};
use crate::session::PageSession;

/// Drives one attached page.
pub struct CdpPageDriver {
    session: PageSession,
}

impl CdpPageDriver {
    pub fn new(session: PageSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &PageSession {
        &self.session
    }

    pub fn into_session(self) -> PageSession {
        self.session
    }

    /// Run a script body. `subject` names the element for detach errors.
    async fn run<T: DeserializeOwned>(
        &self,
        body: &str,
        args: Value,
        subject: &ElementPath,
    ) -> Result<Option<T>, DriverError> {
        let expression = script::build(body, &args);
        trace!(session = self.session.session_id(), "Evaluating page script");

        let reply: Reply<T> = self
            .session
            .evaluate_as(&expression)
            .await
            .map_err(DriverError::from)?;
        if reply.detached {
            let label = subject.last_selector().unwrap_or("document");
            return Err(DriverError::Detached(label.to_string()));
        }
        Ok(reply.value)
    }

    fn element(path: ElementPath, snapshot: ElementSnapshot) -> Element {
        Element::new(path, snapshot.tag, snapshot.text, snapshot.attributes)
    }

    fn path_value(path: &ElementPath) -> Result<Value, DriverError> {
        serde_json::to_value(path).map_err(|e| DriverError::from(CdpError::from(e)))
    }
}

#[async_trait]
impl PageDriver for CdpPageDriver {
    async fn location(&self) -> Result<Url, DriverError> {
        let href = self.session.get_url().await?;
        Url::parse(&href).map_err(|e| DriverError::InvalidLocation(format!("{}: {}", href, e)))
    }

    async fn query_all(
        &self,
        scope: Option<&Element>,
        selector: &str,
    ) -> Result<Vec<Element>, DriverError> {
        let base = scope.map_or_else(ElementPath::root, |el| el.path().clone());
        let args = json!({
            "scope": scope.map(|el| Self::path_value(el.path())).transpose()?,
            "selector": selector,
        });

        let snapshots: Vec<ElementSnapshot> = self
            .run(script::QUERY_ALL, args, &base)
            .await?
            .unwrap_or_default();
        Ok(snapshots
            .into_iter()
            .enumerate()
            .map(|(index, snapshot)| Self::element(base.select(selector, index), snapshot))
            .collect())
    }

    async fn parent(&self, element: &Element) -> Result<Option<Element>, DriverError> {
        let args = json!({ "path": Self::path_value(element.path())? });
        let parent: Option<ElementSnapshot> =
            self.run(script::PARENT, args, element.path()).await?;
        Ok(parent.map(|snapshot| Self::element(element.path().parent(), snapshot)))
    }

    async fn click(&self, element: &Element, style: ClickStyle) -> Result<(), DriverError> {
        let args = json!({
            "path": Self::path_value(element.path())?,
            "dispatch": style == ClickStyle::DispatchAndDirect,
        });
        self.run::<Value>(script::CLICK, args, element.path()).await?;
        Ok(())
    }

    async fn set_value(&self, element: &Element, value: &str) -> Result<(), DriverError> {
        let args = json!({
            "path": Self::path_value(element.path())?,
            "value": value,
        });
        self.run::<Value>(script::SET_VALUE, args, element.path()).await?;
        Ok(())
    }

    async fn dispatch(
        &self,
        target: EventTarget<'_>,
        event: SyntheticEvent,
    ) -> Result<(), DriverError> {
        let (path, subject) = match target {
            EventTarget::Element(el) => (Some(Self::path_value(el.path())?), el.path().clone()),
            EventTarget::Focused => (None, ElementPath::root()),
        };
        let args = script::event_args(path, event);
        self.run::<Value>(script::DISPATCH, args, &subject).await?;
        Ok(())
    }

    async fn navigate(&self, url: &Url) -> Result<(), DriverError> {
        self.session.navigate(url.as_str()).await?;
        Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), DriverError> {
        let args = json!({
            "message": notification.message,
            "style": script::overlay_style(notification.severity),
            "ttl": notification.ttl.as_millis() as u64,
        });
        self.run::<Value>(script::NOTIFY, args, &ElementPath::root())
            .await?;
        Ok(())
    }
}
