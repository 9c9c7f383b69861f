//! # Render Error Type
//!
//! This module defines [`RenderError`], the unified error enum for a render
//! pass.  It aggregates failures from:
//!
//! - **Term operations** (evaluating expressions, converting values to text),
//! - **Module resolution** (unknown modules, missing initializers),
//! - **Live document access** (see [`DocumentError`]).
//!
//! Conversions from the underlying error types are derived with `#[from]`,
//! so `?` works at every call site.  A render pass that fails with any of
//! these errors leaves the live document untouched.

use crate::{DocumentError, ModuleId};
use boxed_terms::TermError;
use thiserror::Error;

/// Represents all possible errors that can occur while rendering and
/// patching.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// A term operation failed, e.g. an expression produced a value that has
    /// no textual form.
    #[error(transparent)]
    Term(#[from] TermError),

    /// A component addressed as stateful (it has a `cid` prop) has no state
    /// yet and no initializer.
    #[error("component {module} is initialized on the client, but doesn't have init implemented")]
    MissingHandler { module: ModuleId },

    /// A template referenced a module that is not in the registry.
    #[error("module {0} is not registered")]
    UnknownModule(ModuleId),

    /// An operation needed a mounted page but none was mounted.
    #[error("no page is mounted")]
    NoPage,

    #[error(transparent)]
    Document(#[from] DocumentError),
}
