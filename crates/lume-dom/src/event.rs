//! Bubbling events.

use core::cell::Cell;
use std::rc::Rc;

use crate::node::Node;

/// An event travelling up the tree from its target.
///
/// Handlers receive a shared handle; `stop_propagation` stops the event
/// from reaching ancestor listeners (listeners on the current node still
/// run), and `prevent_default` records intent for the dispatcher's caller
/// to inspect.
pub struct Event {
	inner: Rc<EventInner>,
}

struct EventInner {
	event_type: String,
	target: Node,
	stopped: Cell<bool>,
	prevented: Cell<bool>,
}

impl Event {
	pub(crate) fn new(event_type: &str, target: Node) -> Event {
		Event {
			inner: Rc::new(EventInner {
				event_type: event_type.to_string(),
				target,
				stopped: Cell::new(false),
				prevented: Cell::new(false),
			}),
		}
	}

	pub fn event_type(&self) -> &str {
		&self.inner.event_type
	}

	/// The node the event was dispatched at, regardless of which listener
	/// along the bubble path is currently running.
	pub fn target(&self) -> &Node {
		&self.inner.target
	}

	pub fn stop_propagation(&self) {
		self.inner.stopped.set(true);
	}

	pub fn propagation_stopped(&self) -> bool {
		self.inner.stopped.get()
	}

	pub fn prevent_default(&self) {
		self.inner.prevented.set(true);
	}

	pub fn default_prevented(&self) -> bool {
		self.inner.prevented.get()
	}
}

impl Clone for Event {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}
