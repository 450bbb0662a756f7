//! # hdr-core
//!
//! Core types for hdr, the castxml-driven C++ header resolver.
//!
//! This crate holds everything the resolver produces and the code generator
//! downstream consumes:
//! - The normalized declaration tree (`CppModule` → `CppInclude` → `CppDecl`)
//! - Resolved type descriptors (`CppType`)
//! - Parameter flags and calling conventions decoded from annotations
//! - GUID values and their initializer-literal parser
//! - Persistence of the module as the on-disk cache
//! - Cross-cutting error types

pub mod errors;
pub mod guid;
pub mod model;
pub mod module;
pub mod types;

pub use errors::CoreError;
pub use guid::Guid;
pub use model::*;
pub use module::{CppInclude, CppModule};
pub use types::{CallingConvention, CppType, ParamFlags};
