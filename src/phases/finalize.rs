//! Phase 6: Route Filtering and Template Unwrapping
//!
//! Turns the assembled collection into what is written:
//!
//! - With route generation disabled, every item whose kind is `Route`
//!   (compared case-insensitively) is dropped. The order of the remaining
//!   items is kept.
//! - When exactly one item remains and it is a `Template`, that template is
//!   the root of the composite document. Otherwise the root is a `List` of
//!   all remaining items.

use serde_yaml::Value;

use crate::resource::{ResourceCollection, ResourceItem};

/// Root of the composite document.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEntity {
    /// A single Template, written as is.
    Template(ResourceItem),
    /// Every item, wrapped in a `kind: List`.
    List(ResourceCollection),
}

impl OutputEntity {
    pub fn to_value(&self) -> Value {
        match self {
            OutputEntity::Template(item) => item.value().clone(),
            OutputEntity::List(collection) => collection.to_list_value(),
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, OutputEntity::Template(_))
    }
}

/// Copy of `collection` without Routes when `generate_route` is false.
pub fn filter_routes(collection: &ResourceCollection, generate_route: bool) -> ResourceCollection {
    if generate_route {
        return collection.clone();
    }
    ResourceCollection::new(
        collection
            .iter()
            .filter(|item| !item.is_kind("Route"))
            .cloned()
            .collect(),
    )
}

/// The composite root for an already filtered collection.
pub fn unwrap_template(filtered: &ResourceCollection) -> OutputEntity {
    match filtered.items() {
        [single] if single.kind() == "Template" => OutputEntity::Template(single.clone()),
        _ => OutputEntity::List(filtered.clone()),
    }
}

/// Executes Phase 6: returns the composite root and the filtered collection.
pub fn execute(
    collection: &ResourceCollection,
    generate_route: bool,
) -> (OutputEntity, ResourceCollection) {
    let filtered = filter_routes(collection, generate_route);
    (unwrap_template(&filtered), filtered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(kinds: &[&str]) -> ResourceCollection {
        ResourceCollection::new(
            kinds
                .iter()
                .enumerate()
                .map(|(i, kind)| ResourceItem::new(kind, &format!("item-{}", i)))
                .collect(),
        )
    }

    #[test]
    fn test_routes_kept_when_generating_routes() {
        let input = collection(&["Service", "Route"]);
        let (entity, filtered) = execute(&input, true);
        assert_eq!(filtered, input);
        assert!(!entity.is_template());
    }

    #[test]
    fn test_routes_removed_case_insensitively() {
        let input = ResourceCollection::new(vec![
            ResourceItem::new("Service", "a"),
            ResourceItem::new("route", "b"),
            ResourceItem::new("ROUTE", "c"),
            ResourceItem::new("Deployment", "d"),
        ]);
        let (_, filtered) = execute(&input, false);
        let names: Vec<_> = filtered.iter().map(|i| i.name().unwrap()).collect();
        assert_eq!(names, vec!["a", "d"]);
    }

    #[test]
    fn test_single_template_is_unwrapped() {
        let input = collection(&["Route", "Template"]);
        let (entity, filtered) = execute(&input, false);
        assert_eq!(filtered.len(), 1);
        match entity {
            OutputEntity::Template(item) => assert_eq!(item.name(), Some("item-1")),
            other => panic!("expected template, got {:?}", other),
        }
    }

    #[test]
    fn test_template_next_to_other_items_stays_in_list() {
        let input = collection(&["Template", "Service"]);
        let (entity, _) = execute(&input, true);
        assert!(!entity.is_template());
        assert_eq!(
            entity.to_value().get("kind").and_then(Value::as_str),
            Some("List")
        );
    }

    #[test]
    fn test_empty_collection_is_empty_list() {
        let (entity, filtered) = execute(&ResourceCollection::default(), false);
        assert!(filtered.is_empty());
        assert_eq!(entity, OutputEntity::List(ResourceCollection::default()));
    }
}
