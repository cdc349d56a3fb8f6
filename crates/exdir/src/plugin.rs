//! Dataset transform plugins.
//!
//! A plugin intercepts dataset values on their way to and from disk: the
//! write hook may rewrite the value and contribute attributes and metadata,
//! the read hook reverses the transform. Plugins run in registration order,
//! and the order must be identical between write and read for round-trip
//! correctness -- the registry is fixed when the file is opened and never
//! changes underneath a handle.
//!
//! A plugin that reports itself `required` has its identifier persisted
//! into the dataset's metadata; reading that dataset later without the
//! plugin registered is an error. Non-required plugins leave no trace, so
//! their absence on a later open is never an error.

use std::fmt;
use std::sync::Arc;

use serde_yml::{Mapping, Value as YamlValue};

use exdir_npy::Value;

use crate::error::Result;

/// Metadata contributed by a plugin's write hook.
#[derive(Clone, Debug, Default)]
pub struct PluginMeta {
    /// Whether the dataset becomes unreadable without this plugin.
    pub required: bool,
    /// Additional per-plugin bookkeeping, persisted next to the flag.
    pub extra: Mapping,
}

impl PluginMeta {
    /// Metadata for a plugin the dataset cannot be read without.
    pub fn required() -> Self {
        Self {
            required: true,
            extra: Mapping::new(),
        }
    }

    /// Metadata for a plugin whose absence is harmless.
    pub fn optional() -> Self {
        Self::default()
    }

    /// Attach one bookkeeping entry.
    pub fn with_extra(mut self, key: &str, value: impl Into<YamlValue>) -> Self {
        self.extra.insert(YamlValue::from(key), value.into());
        self
    }
}

/// The result of a plugin's write hook.
#[derive(Clone, Debug)]
pub struct WriteOutcome {
    /// The (possibly rewritten) value handed to the next plugin.
    pub value: Value,
    /// Attributes merged into the dataset's attribute sidecar.
    pub attributes: Mapping,
    /// Plugin metadata recorded under the dataset's `plugins` table.
    pub meta: PluginMeta,
}

impl WriteOutcome {
    /// An outcome that passes the value through untouched.
    pub fn passthrough(value: Value) -> Self {
        Self {
            value,
            attributes: Mapping::new(),
            meta: PluginMeta::optional(),
        }
    }
}

/// A dataset read/write transform stage.
pub trait DatasetPlugin: Send + Sync {
    /// Stable identifier persisted into dataset metadata.
    fn identifier(&self) -> &str;

    /// Transform a value on its way to disk.
    fn prepare_write(&self, value: Value) -> Result<WriteOutcome>;

    /// Reverse the transform on a value read from disk. The dataset's
    /// current attribute mapping is supplied for context.
    fn prepare_read(&self, value: Value, attributes: &Mapping) -> Result<Value>;
}

/// An ordered, fixed set of dataset plugins.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn DatasetPlugin>>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration; order is significant.
    pub fn with(mut self, plugin: Arc<dyn DatasetPlugin>) -> Self {
        self.register(plugin);
        self
    }

    /// Append a plugin to the pipeline.
    pub fn register(&mut self, plugin: Arc<dyn DatasetPlugin>) {
        self.plugins.push(plugin);
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Whether a plugin with this identifier is registered.
    pub fn is_registered(&self, identifier: &str) -> bool {
        self.plugins.iter().any(|p| p.identifier() == identifier)
    }

    /// Registered identifiers, in pipeline order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|p| p.identifier())
    }

    /// Run the write pipeline. Returns the final value, the merged
    /// attribute contributions, and the `plugins` table to persist (only
    /// plugins that flagged themselves required appear in it).
    pub(crate) fn run_write(&self, mut value: Value) -> Result<(Value, Mapping, Mapping)> {
        let mut attributes = Mapping::new();
        let mut table = Mapping::new();
        for plugin in &self.plugins {
            let outcome = plugin.prepare_write(value)?;
            value = outcome.value;
            for (key, entry) in outcome.attributes {
                attributes.insert(key, entry);
            }
            if outcome.meta.required {
                let mut entry = outcome.meta.extra;
                entry.insert("required".into(), true.into());
                table.insert(
                    YamlValue::from(plugin.identifier()),
                    YamlValue::Mapping(entry),
                );
            }
        }
        Ok((value, attributes, table))
    }

    /// Run the read pipeline in registration order.
    pub(crate) fn run_read(&self, mut value: Value, attributes: &Mapping) -> Result<Value> {
        for plugin in &self.plugins {
            value = plugin.prepare_read(value, attributes)?;
        }
        Ok(value)
    }
}

// Plugin state is opaque; Debug lists the pipeline's identifiers only.
impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.identifiers()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AddOne;

    impl DatasetPlugin for AddOne {
        fn identifier(&self) -> &str {
            "add_one"
        }

        fn prepare_write(&self, value: Value) -> Result<WriteOutcome> {
            let value = match value {
                Value::I64(a) => Value::I64(a.mapv(|x| x + 1)),
                other => other,
            };
            Ok(WriteOutcome {
                value,
                attributes: Mapping::new(),
                meta: PluginMeta::required(),
            })
        }

        fn prepare_read(&self, value: Value, _attributes: &Mapping) -> Result<Value> {
            let value = match value {
                Value::I64(a) => Value::I64(a.mapv(|x| x - 1)),
                other => other,
            };
            Ok(value)
        }
    }

    struct Tagger;

    impl DatasetPlugin for Tagger {
        fn identifier(&self) -> &str {
            "tagger"
        }

        fn prepare_write(&self, value: Value) -> Result<WriteOutcome> {
            let mut attributes = Mapping::new();
            attributes.insert("tagged".into(), true.into());
            Ok(WriteOutcome {
                value,
                attributes,
                meta: PluginMeta::optional(),
            })
        }

        fn prepare_read(&self, value: Value, _attributes: &Mapping) -> Result<Value> {
            Ok(value)
        }
    }

    #[test]
    fn write_pipeline_collects_contributions() {
        let registry = PluginRegistry::new()
            .with(Arc::new(AddOne))
            .with(Arc::new(Tagger));

        let (value, attributes, table) =
            registry.run_write(Value::from(vec![1i64, 2])).unwrap();
        assert_eq!(value, Value::from(vec![2i64, 3]));
        assert_eq!(attributes.get("tagged"), Some(&YamlValue::from(true)));

        // Only the required plugin is persisted.
        assert!(table.contains_key("add_one"));
        assert!(!table.contains_key("tagger"));
    }

    #[test]
    fn read_reverses_write() {
        let registry = PluginRegistry::new().with(Arc::new(AddOne));
        let original = Value::from(vec![10i64, 20]);
        let (stored, _, _) = registry.run_write(original.clone()).unwrap();
        assert_ne!(stored, original);
        let restored = registry.run_read(stored, &Mapping::new()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn registry_lookup() {
        let registry = PluginRegistry::new().with(Arc::new(AddOne));
        assert!(registry.is_registered("add_one"));
        assert!(!registry.is_registered("missing"));
        assert_eq!(registry.identifiers().collect::<Vec<_>>(), vec!["add_one"]);
    }

    #[test]
    fn meta_with_extra() {
        let meta = PluginMeta::required().with_extra("codec", "shift");
        assert!(meta.required);
        assert_eq!(meta.extra.get("codec"), Some(&YamlValue::from("shift")));
    }
}
