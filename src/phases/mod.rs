//! Implementation of the phases of a resource generation run.
//!
//! ## Overview
//!
//! A run goes through eight phases:
//! 1. Fragment Discovery - list local fragments and fetch remote ones
//! 2. Placeholder Expansion - copy fragments into the work directory with `${...}` resolved
//! 3. Resource Assembly - parse fragments into resource items, inferring kinds and names
//! 4. Generation and Enrichment - synthesize default resources, then enrich every item
//! 5. Profile Overlays - repeat phases 1-4 per profile directory and append the results
//! 6. Route Filtering and Template Unwrapping - pick what is written and the composite root
//! 7. Writing to Disk - composite document plus one file per item
//! 8. Validation - check the written files and apply the validation policy
//!
//! Phases 1 and 2 and the generators run once per invocation. Phases 3 to 8
//! run once per platform (kubernetes, openshift). The [`orchestrator`] wires
//! the phases together.

pub mod assemble;
pub mod enrich;
pub mod expand;
pub mod finalize;
pub mod fragments;
pub mod orchestrator;
pub mod profiles;
pub mod validate;
pub mod write;

pub use fragments as phase1;
pub use expand as phase2;
pub use assemble as phase3;
pub use enrich as phase4;
pub use profiles as phase5;
pub use finalize as phase6;
pub use write as phase7;
pub use validate as phase8;
