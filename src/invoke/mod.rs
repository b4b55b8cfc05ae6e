//! Hook invocation and field access
//!
//! [`HandleCache`] memoizes one direct handle (or an explicit "unavailable"
//! marker) per member; [`Invoker`] uses those handles and falls back to
//! by-name dispatch through [`crate::reflect::Reflect`].

mod cache;
mod error;
mod handle;
mod invoker;

pub use cache::{DEFAULT_HANDLE_CAPACITY, HandleCache};
pub use error::InvokeError;
pub use handle::BindPolicy;
pub use invoker::Invoker;
