//! # Resource Forge Library
//!
//! This library turns a project's image configuration and a tree of manifest
//! fragments into validated Kubernetes and OpenShift manifests. It is
//! designed to be used by the `resource-forge` command-line tool but can also
//! be embedded in other build tooling.
//!
//! ## Quick Example
//!
//! ```
//! use resource_forge::phases::finalize;
//! use resource_forge::resource::{ResourceCollection, ResourceItem};
//!
//! let collection = ResourceCollection::new(vec![
//!     ResourceItem::new("Template", "shop"),
//!     ResourceItem::new("Route", "shop"),
//! ]);
//!
//! // Without route generation the lone Template becomes the document root
//! let (root, filtered) = finalize::execute(&collection, false);
//! assert!(root.is_template());
//! assert_eq!(filtered.len(), 1);
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`, `defaults`)**: the `.resource-forge.yaml`
//!   schema: project identity, images, directories, processor configuration
//!   and output flags.
//! - **Resources (`resource`, `mapping`)**: manifests as opaque YAML payloads
//!   with typed access to `kind`, `apiVersion` and `metadata`, plus the
//!   kind/filename mapping used for reading and writing.
//! - **Processors (`processor`)**: named generators and enrichers, selected
//!   and ordered by configuration through a registry.
//! - **Profiles (`profile`)**: named processor configuration, resolved from
//!   project files and the profiles compiled into the binary.
//! - **Images (`image`)**: image configuration, its resolution and naming.
//! - **Validation (`validation`)**: the rule set checked against written output.
//!
//! ## Execution Flow
//!
//! The main entry point is the `phases::orchestrator`. Once per invocation it
//! resolves configuration, runs the generators and expands the fragments;
//! then, for every platform:
//!
//! 1.  **Assembly**: parse fragments into resource items.
//! 2.  **Enrichment**: synthesize default resources and enrich every item.
//! 3.  **Profiles**: repeat assembly and enrichment per profile directory.
//! 4.  **Finalization**: drop Routes if requested, unwrap a lone Template.
//! 5.  **Output**: write the composite document and one file per item.
//! 6.  **Validation**: check the written files under the validation policy.

pub mod config;
pub mod defaults;
pub mod error;
pub mod fetch;
pub mod image;
pub mod mapping;
pub mod output;
pub mod phases;
pub mod processor;
pub mod profile;
pub mod resource;
pub mod suggestions;
pub mod validation;

mod finalize_proptest;
