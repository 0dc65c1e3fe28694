//! bumbo core library: metadata catalog, component requests, project layout.
//!
//! - [`types`]: newtypes, the `Type:name,...` request grammar, batches
//! - [`catalog`]: [`MetadataCatalog`] lookups
//! - [`project`]: project root discovery, `.bumbo/` layout, `init`
//! - [`config`]: [`BumboConfig`] loading
//! - [`error`]: [`CoreError`]

pub mod catalog;
pub mod config;
pub mod error;
pub mod project;
pub mod types;

pub use catalog::{FileLayout, MetadataCatalog, TypeDescriptor};
pub use config::BumboConfig;
pub use error::CoreError;
pub use project::ProjectLayout;
pub use types::{
    Component, ComponentBatch, ComponentIdentity, ComponentRequest, MetadataTypeName,
};
