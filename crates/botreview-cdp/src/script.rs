//! Page-side scripts for the driver.
//!
//! Every script is a self-contained expression: a shared prelude that can
//! resolve an [`ElementPath`](botreview_core::ElementPath), the call's
//! arguments inlined as a JSON literal, and an operation body. Bodies reply
//! with `{ value }` on success or `{ detached: true }` when a path no longer
//! resolves.

use std::collections::BTreeMap;

use botreview_core::{Severity, SyntheticEvent};
use serde::Deserialize;
use serde_json::{Value, json};

const PRELUDE: &str = r#"
const resolve = (path) => {
  let node = document;
  for (const step of path) {
    node = step.op === "select"
      ? node.querySelectorAll(step.selector)[step.index]
      : node.parentElement;
    if (!node) return null;
  }
  return node;
};
const snapshot = (el) => ({
  tag: el.tagName.toLowerCase(),
  text: el.textContent || "",
  attributes: Object.fromEntries(Array.from(el.attributes, (a) => [a.name, a.value])),
});
"#;

pub(crate) const QUERY_ALL: &str = r#"
const scope = args.scope === null ? document : resolve(args.scope);
if (!scope) return { detached: true };
return { value: Array.from(scope.querySelectorAll(args.selector), snapshot) };
"#;

pub(crate) const PARENT: &str = r#"
const el = resolve(args.path);
if (!el) return { detached: true };
return { value: el.parentElement ? snapshot(el.parentElement) : null };
"#;

pub(crate) const CLICK: &str = r#"
const el = resolve(args.path);
if (!el) return { detached: true };
if (args.dispatch) {
  el.dispatchEvent(new MouseEvent("click", { bubbles: true, cancelable: true, view: window }));
}
el.click();
return {};
"#;

pub(crate) const SET_VALUE: &str = r#"
const el = resolve(args.path);
if (!el) return { detached: true };
el.focus();
el.value = args.value;
return {};
"#;

pub(crate) const DISPATCH: &str = r#"
const target = args.path === null
  ? (document.activeElement || document.body)
  : resolve(args.path);
if (!target) return { detached: true };
const init = { bubbles: true, cancelable: true };
let event;
if (args.type === "input") {
  event = new Event("input", init);
} else if (args.key) {
  const k = args.key;
  event = new KeyboardEvent(args.type, { ...init, key: k.key, code: k.code, keyCode: k.keyCode, which: k.keyCode, shiftKey: k.shiftKey });
  Object.defineProperty(event, "keyCode", { get: () => k.keyCode });
  Object.defineProperty(event, "which", { get: () => k.keyCode });
} else {
  event = new KeyboardEvent(args.type, init);
}
target.dispatchEvent(event);
return {};
"#;

pub(crate) const NOTIFY: &str = r#"
const box = document.createElement("div");
box.style.cssText = args.style;
box.textContent = args.message;
document.body.appendChild(box);
setTimeout(() => box.remove(), args.ttl);
return {};
"#;

/// Wrap an operation body into an evaluable expression.
pub(crate) fn build(body: &str, args: &Value) -> String {
    format!("(() => {{{PRELUDE}const args = {args};{body}}})()")
}

/// Script reply envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Reply<T> {
    #[serde(default)]
    pub detached: bool,
    pub value: Option<T>,
}

/// Element as serialized by the prelude's `snapshot`.
#[derive(Debug, Deserialize)]
pub(crate) struct ElementSnapshot {
    pub tag: String,
    pub text: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Arguments for [`DISPATCH`].
pub(crate) fn event_args(path: Option<Value>, event: SyntheticEvent) -> Value {
    let key = event.key().map(|key| {
        json!({
            "key": key.key(),
            "code": key.code(),
            "keyCode": key.key_code(),
            "shiftKey": key.shift(),
        })
    });
    json!({
        "path": path,
        "type": event.event_type(),
        "key": key,
    })
}

/// Inline style for the notification overlay.
pub(crate) fn overlay_style(severity: Severity) -> String {
    format!(
        "position: fixed; top: 20px; right: 20px; background: {}; color: white; \
         padding: 12px 20px; border-radius: 4px; z-index: 10000; \
         font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; \
         font-size: 14px; box-shadow: 0 2px 10px rgba(0,0,0,0.1);",
        severity.color()
    )
}
