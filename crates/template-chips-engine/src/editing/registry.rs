use std::collections::BTreeMap;

use log::trace;

use crate::error::{EngineError, Result};
use crate::models::embed::EmbedType;

/// Embed types known to a host document, keyed by type tag.
#[derive(Default)]
pub struct EmbedRegistry {
    types: BTreeMap<&'static str, Box<dyn EmbedType>>,
}

impl EmbedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an embed type.
    ///
    /// Registering the same descriptor again is a no-op; a different
    /// descriptor under an existing tag is rejected.
    pub fn register(&mut self, embed: Box<dyn EmbedType>) -> Result<()> {
        let descriptor = embed.descriptor();
        if let Some(existing) = self.types.get(descriptor.tag) {
            if existing.descriptor() == descriptor {
                trace!("embed type {:?} already registered", descriptor.tag);
                return Ok(());
            }
            return Err(EngineError::RegistryConflict {
                tag: descriptor.tag.to_string(),
            });
        }
        trace!("registering embed type {:?}", descriptor.tag);
        self.types.insert(descriptor.tag, embed);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<&dyn EmbedType> {
        self.types.get(tag).map(|embed| embed.as_ref())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    /// Embed type whose chips carry `class`.
    pub fn find_by_class(&self, class: &str) -> Option<&dyn EmbedType> {
        self.types
            .values()
            .find(|embed| embed.descriptor().class == class)
            .map(|embed| embed.as_ref())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl std::fmt::Debug for EmbedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.types.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::embed::{Chip, EmbedDescriptor};
    use crate::models::marker::{MarkerPayload, TEMPLATE_MARKER_TAG, TemplateMarker};

    /// Same tag as the marker, different element
    struct Impostor;

    impl EmbedType for Impostor {
        fn descriptor(&self) -> EmbedDescriptor {
            EmbedDescriptor {
                tag: TEMPLATE_MARKER_TAG,
                element: "div",
                class: "impostor",
            }
        }

        fn present(&self, payload: &MarkerPayload) -> Chip {
            Chip::new("div", &payload.title)
        }

        fn extract(&self, chip: &Chip) -> Result<MarkerPayload> {
            Ok(MarkerPayload::new("", &chip.label))
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = EmbedRegistry::new();
        registry.register(Box::new(TemplateMarker)).unwrap();
        registry.register(Box::new(TemplateMarker)).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(TEMPLATE_MARKER_TAG));
    }

    #[test]
    fn test_register_conflict() {
        let mut registry = EmbedRegistry::new();
        registry.register(Box::new(TemplateMarker)).unwrap();

        let err = registry.register(Box::new(Impostor)).unwrap_err();
        assert!(matches!(err, EngineError::RegistryConflict { tag } if tag == TEMPLATE_MARKER_TAG));
        assert_eq!(
            registry.get(TEMPLATE_MARKER_TAG).unwrap().descriptor(),
            TemplateMarker::DESCRIPTOR
        );
    }

    #[test]
    fn test_find_by_class() {
        let mut registry = EmbedRegistry::new();
        registry.register(Box::new(TemplateMarker)).unwrap();

        assert!(registry.find_by_class("dynamic-variable").is_some());
        assert!(registry.find_by_class("other").is_none());
        assert!(registry.get("Unknown").is_none());
    }
}
