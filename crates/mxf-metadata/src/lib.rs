//! The metadata object graph: type registry, primer, and reference
//! resolver (spec §3, §4.5-§4.6).

mod error;
mod object;
mod primer;
pub mod registry;
mod resolver;

pub use error::{Error, Result};
pub use object::{MetadataObject, Property, PropertyValue};
pub use primer::Primer;
pub use registry::{PropertyDescriptor, PropertyKind, StaticRegistry, TypeDescriptor, TypeRegistry};
pub use resolver::{DanglingWeakRef, ObjectId, RefKind, ReferenceResolver};
