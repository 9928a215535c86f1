//! In-memory document tree for lume.
//!
//! A small, headless stand-in for a browser document: elements with
//! attributes, inline styles, form-control state, and event listeners;
//! text and comment nodes; bubbling event dispatch; and a serializer for
//! inspecting rendered output in tests.
//!
//! ## Example
//!
//! ```
//! use lume_dom::Document;
//!
//! let doc = Document::new();
//! let div = doc.create_element("div");
//! div.set_attribute("id", "app");
//! div.append_child(&doc.create_text_node("hello"));
//! doc.body().append_child(&div);
//!
//! let found = doc.query_selector("#app").unwrap();
//! assert_eq!(found.text_content(), "hello");
//! ```

mod document;
mod event;
mod node;

pub use document::Document;
pub use event::Event;
pub use node::{ListenerId, Node};
