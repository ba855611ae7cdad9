//! Schema Bind
//!
//! Compiles a set of JSON Schema documents into typed, constructible data
//! models, and parses raw JSON instances into validated values of those
//! models.
//!
//! ## Features
//!
//! - **Handle Arena**: generational handles give stable, checked references
//!   to live schema objects
//! - **Dependency Graph**: schema-to-schema references are ordered
//!   dependencies-first; cycles fail fast at edge insertion
//! - **Schema Registry**: one schema per URL, deduplicated, with `$ref`,
//!   inline `definitions`, and `allOf` resolution
//! - **Keyword Pipeline**: Type/Properties/AllOf/Required compile each
//!   schema into an immutable `Representation`
//! - **Model Interpreter**: representations synthesize into constructible,
//!   validated model types; no generated source required
//!
//! ## Pipeline
//!
//! ```text
//! documents --> SchemaRegistry --> DependencyGraph --> KeywordCompiler
//!                   (by URL)        (ordered, acyclic)       |
//!                                                            v
//! JSON text --> parser --> ModelSet <-- CompilationContext (Representations)
//! ```

pub mod arena;
pub mod error;
pub mod graph;
pub mod ir;
pub mod keywords;
pub mod loader;
pub mod model;
pub mod names;
pub mod parser;
pub mod registry;
pub mod schema;

pub use arena::{Handle, HandleArena};
pub use error::{CompileError, GraphError, HandleError, ModelError, Result};
pub use graph::{DependencyGraph, DependencyNode};
pub use ir::{ClassContext, CompilationContext, DataMember, Parameter, Representation};
pub use keywords::KeywordCompiler;
pub use loader::{DocumentLoader, FileSystemLoader, LoadedBundle};
pub use model::{Arguments, Instance, ModelSet, ModelValue};
pub use registry::SchemaRegistry;
pub use schema::Schema;
