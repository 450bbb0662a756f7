//! # hdr-parser
//!
//! C++ declaration resolver on top of castxml.
//!
//! The [`CppParser`] driver writes umbrella headers for the configured units,
//! runs castxml twice (a `-E -dD` macro pass and a gccxml-format XML pass),
//! indexes the XML, and turns it into an [`hdr_core::CppModule`]: enums,
//! structs and unions, COM interfaces with vtable offsets, functions,
//! constants, GUIDs and captured macros.
//!
//! Fatal conditions come back as [`ParserError`]; everything a run survives
//! is recorded on its [`Logger`].

pub mod annotations;
pub mod builders;
pub mod castxml;
pub mod docs;
pub mod driver;
pub mod error;
pub mod headers;
pub mod index;
pub mod logger;
pub mod macros;
pub mod resolver;

pub use annotations::Annotations;
pub use castxml::{CastXml, DiagnosticRouter, ExternalParser, ProcessOutput};
pub use docs::{DocItem, DocSubItem, DocumentationProvider, JsonDocumentation, NoDocumentation};
pub use driver::{CppParser, DriverState};
pub use error::ParserError;
pub use index::DeclIndex;
pub use logger::{Diagnostic, Location, Logger, Severity};
pub use macros::{MacroManager, MacroSet};
pub use resolver::TypeResolver;
