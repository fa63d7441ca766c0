//! Filter registry mapping directive names to filter constructors.

use crate::core::filter::ImageFilter;
use crate::core::types::Parameters;
use indexmap::IndexMap;
use std::sync::Arc;

/// Factory function for creating filter instances from directive arguments.
///
/// Factories never fail: missing or wrong-typed parameters fall back to the
/// filter's defaults.
pub type FilterFactory = Arc<dyn Fn(&Parameters) -> Box<dyn ImageFilter> + Send + Sync>;

/// Registry for all available filter types.
///
/// Names are matched exactly. Aliases resolve to another registered name and
/// construct the same filter, so they share its signature.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    /// Factories indexed by name, in registration order.
    filters: IndexMap<String, FilterFactory>,
    /// Alternative names pointing at an entry in `filters`.
    aliases: IndexMap<String, String>,
}

impl FilterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            filters: IndexMap::new(),
            aliases: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with built-in filters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::filters::builtin::register_all(&mut registry);
        registry
    }

    /// Register a filter constructor under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Parameters) -> Box<dyn ImageFilter> + Send + Sync + 'static,
    {
        let name = name.into();
        self.aliases.shift_remove(&name);
        self.filters.insert(name, Arc::new(factory));
    }

    /// Make `alias` construct the filter registered as `target`.
    ///
    /// Returns false if `target` is not registered.
    pub fn register_alias(&mut self, alias: impl Into<String>, target: &str) -> bool {
        if !self.filters.contains_key(target) {
            return false;
        }
        self.aliases.insert(alias.into(), target.to_string());
        true
    }

    /// Construct a filter by name. Unknown names yield `None`.
    pub fn create(&self, name: &str, params: &Parameters) -> Option<Box<dyn ImageFilter>> {
        self.factory(name).map(|factory| factory(params))
    }

    /// Look up the factory for a name or alias.
    pub fn factory(&self, name: &str) -> Option<&FilterFactory> {
        let canonical = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.filters.get(canonical)
    }

    /// Check if a filter (or alias) is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factory(name).is_some()
    }

    /// Registered filter names, without aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(|s| s.as_str())
    }

    /// Registered aliases and their targets.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Unregister a filter and any aliases pointing at it.
    pub fn unregister(&mut self, name: &str) -> bool {
        if self.filters.shift_remove(name).is_some() {
            self.aliases.retain(|_, target| target.as_str() != name);
            true
        } else {
            self.aliases.shift_remove(name).is_some()
        }
    }

    /// Get the total number of registered filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ParamValue;
    use crate::filters::builtin::Invert;

    #[test]
    fn test_builtins_are_registered() {
        let registry = FilterRegistry::with_builtins();
        for name in [
            "invert",
            "transparent",
            "boost-lightness",
            "contrast",
            "sharpness",
            "darkmode",
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_unknown_name_yields_none() {
        let registry = FilterRegistry::with_builtins();
        assert!(registry.create("sepia", &Parameters::new()).is_none());
        assert!(!registry.contains("Invert"));
    }

    #[test]
    fn test_create_with_parameters() {
        let registry = FilterRegistry::with_builtins();
        let mut params = Parameters::new();
        params.insert("amount".to_string(), ParamValue::Number(2.0));

        let filter = registry.create("contrast", &params).unwrap();
        assert_eq!(filter.signature(), "contrast(amount=2)");

        let filter = registry.create("contrast", &Parameters::new()).unwrap();
        assert_eq!(filter.signature(), "contrast(amount=1)");
    }

    #[test]
    fn test_alias_resolves_to_target() {
        let registry = FilterRegistry::with_builtins();
        let filter = registry.create("dark", &Parameters::new()).unwrap();
        assert_eq!(filter.name(), "darkmode");
        assert_eq!(filter.signature(), "darkmode");
        assert!(registry.aliases().any(|(alias, target)| alias == "dark" && target == "darkmode"));
    }

    #[test]
    fn test_alias_requires_target() {
        let mut registry = FilterRegistry::new();
        assert!(!registry.register_alias("flip", "invert"));
        registry.register("invert", |_| Box::new(Invert));
        assert!(registry.register_alias("flip", "invert"));
        assert!(registry.contains("flip"));
    }

    #[test]
    fn test_unregister_drops_aliases() {
        let mut registry = FilterRegistry::with_builtins();
        assert!(registry.unregister("darkmode"));
        assert!(!registry.contains("darkmode"));
        assert!(!registry.contains("dark"));
        assert!(!registry.unregister("darkmode"));
    }
}
