//! # botreview CDP
//!
//! Chrome DevTools Protocol backend for the engine. It attaches to a
//! browser the user already runs and drives pull-request pages in it.
//!
//! ## Usage
//!
//! 1. Start the browser with remote debugging:
//!    ```bash
//!    chrome --remote-debugging-port=9222
//!    ```
//!
//! 2. Attach and drive a page:
//!    ```rust,ignore
//!    let client = CdpClient::connect("http://localhost:9222").await?;
//!    let page = client.find_page("pull/7").await?;
//!    let driver = CdpPageDriver::new(client.attach_page(&page.id).await?);
//!    ```

mod client;
mod driver;
mod error;
mod protocol;
mod script;
mod session;

pub use client::{CdpClient, discover, fetch_pages, select_page};
pub use driver::CdpPageDriver;
pub use error::CdpError;
pub use protocol::{BrowserVersion, PageInfo};
pub use session::PageSession;
