//! # Boxed Terms Render
//!
//! A template renderer and incremental document patcher over
//! [`boxed_terms`] values.
//!
//! Compiled templates ([`Node`] trees) are resolved through a [`Registry`]
//! of page, layout and component modules.  A [`Renderer`] pass evaluates
//! them against application state into display trees ([`VNode`]), turning
//! `on_click` and `on_submit` attributes into [`EventBinding`]s.  A
//! [`Patcher`] applies display trees to one container of a live
//! [`Document`], issuing only the mutations needed to get from the
//! previous tree to the new one.  [`Runtime`] ties these together with a
//! [`Dispatcher`] that receives an [`OperationDescriptor`] for every
//! handled event.
//!
//! ## Example
//! ```rust
//! # use boxed_terms::{atom, map};
//! # use boxed_terms_render::*;
//! let registry = Registry::new().with(
//!     "Counter",
//!     Module::new(|| {
//!         Node::element(
//!             "button",
//!             vec![Attribute::literal("on_click", "increment")],
//!             vec![Node::Expression(Expression::var("count"))],
//!         )
//!     }),
//! );
//!
//! let mut document = MemoryDocument::new();
//! let container = document.root();
//! let mut runtime = Runtime::new(registry, document, container, Vec::new());
//! runtime
//!     .mount_page("Counter".into(), map! { atom!("count") => 0 })
//!     .unwrap();
//! assert_eq!(runtime.document().inner_html(container).unwrap(), "<button>0</button>");
//!
//! let button = runtime.document().children(container).unwrap()[0];
//! runtime.dispatch_event(&mut HostEvent::click(button)).unwrap();
//! assert_eq!(runtime.dispatcher()[0].action, atom!("increment"));
//!
//! let stats = runtime.update_state(map! { atom!("count") => 1 }).unwrap();
//! assert_eq!(stats.texts_updated, 1);
//! assert_eq!(stats.created, 0);
//! ```
//!
//! ## License
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0 or
//! (at your option) any later version (LGPL-3.0-or-later).

mod context;
mod document;
mod error;
mod event;
mod patch;
mod registry;
mod render;
mod runtime;
mod store;
mod template;
mod vdom;

pub use context::{DEFAULT_SLOT, RenderContext, SlotContent, Slots};
pub use document::{Document, DocumentError, MemoryDocument, NodeId};
pub use error::RenderError;
pub use event::{
    Dispatcher, EventBinding, EventKind, HostEvent, OperationDescriptor, dispatch_event,
};
pub use patch::{PatchStats, Patcher};
pub use registry::{Component, Module, ModuleId, Registry};
pub use render::{CID_PROP, Renderer};
pub use runtime::Runtime;
pub use store::ComponentStore;
pub use template::{AttrValue, Attribute, Evaluator, Expression, Node};
pub use vdom::{KEY_ATTR, VElement, VNode};
