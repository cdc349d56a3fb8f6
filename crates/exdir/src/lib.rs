//! Hierarchical, filesystem-backed array object store.
//!
//! Exdir mirrors an HDF5-like data model directly onto directory
//! structure: one subdirectory per logical object, with sidecar YAML files
//! for typing and attributes and one NPY file per dataset payload. All
//! cross-process-visible invariants are carried by filesystem conventions
//! alone -- there is no central index, lock file, or registry.
//!
//! # Object Model
//!
//! - [`File`] -- a store root: a directory whose metadata record carries
//!   the "file" type. Discovered from any nested path by an upward walk.
//! - [`Group`] -- a typed container of other objects.
//! - [`Dataset`] -- a typed object holding one lazily memory-mapped array
//!   payload, read and written through a transform plugin pipeline.
//! - [`Raw`] -- a plain directory that opted out of the typed-object
//!   conventions; unmanaged blob space.
//!
//! # Directory Layout
//!
//! ```text
//! <object>/exdir.yaml        metadata: {exdir: {type, version}}
//! <object>/attributes.yaml   user attributes (reserved key: plugins)
//! <object>/data.npy          dataset payload (datasets only)
//! ```
//!
//! # Design Rules
//!
//! 1. Raw-ness is derived, never stored: a directory without a valid
//!    metadata record classifies as raw, and malformed metadata demotes
//!    rather than errors.
//! 2. Handles are thin, recreatable views over a directory path. Two
//!    handles over the same object share nothing in memory; reopen to
//!    observe another handle's writes.
//! 3. Dataset payloads map lazily, in the mode the store was opened with,
//!    and are rewritten whole only when the shape changes.
//! 4. Structural filesystem errors propagate unchanged; domain violations
//!    error at the point of violation with no local recovery.

pub mod attribute;
pub mod dataset;
pub mod error;
pub mod file;
pub mod group;
pub mod meta;
pub mod names;
pub mod object;
pub mod plugin;
pub mod raw;
pub mod resolve;

pub use attribute::Attribute;
pub use dataset::{Dataset, Rows, DATA_FILENAME};
pub use error::{ExdirError, Result};
pub use file::{File, OpenMode, OpenOptions};
pub use group::{Group, Node};
pub use meta::{ObjectType, ATTRIBUTES_FILENAME, META_FILENAME};
pub use names::NamePolicy;
pub use object::{IoMode, Object};
pub use plugin::{DatasetPlugin, PluginMeta, PluginRegistry, WriteOutcome};
pub use raw::Raw;
pub use resolve::{find_root, is_inside_store, open_object, open_object_with, resolve};

// Re-export the array codec's vocabulary so callers can address and build
// values without a direct dependency.
pub use exdir_npy::{ScalarType, SliceInfoElem, Value};
