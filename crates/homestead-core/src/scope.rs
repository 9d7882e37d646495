//! Export scope registry
//!
//! Maps each export scope to the ordered list of collections it covers.
//! Registry order is the iteration order used by every export.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Collection holding export history entries
pub const EXPORT_HISTORY_COLLECTION: &str = "export_history";
/// Collection holding import history entries
pub const IMPORT_HISTORY_COLLECTION: &str = "import_history";

const GARDEN: &[&str] = &["garden_beds", "plantings", "seeds", "harvests"];

const LIVESTOCK: &[&str] = &[
    "herds",
    "animals",
    "breeding_records",
    "health_records",
    "feed_logs",
    "production_logs",
];

const TASKS: &[&str] = &["tasks", "notification_tasks"];

const FINANCES: &[&str] = &["transactions", "budgets", "invoices"];

const ORCHARD: &[&str] = &["orchard_trees", "orchard_harvests"];

const APIARY: &[&str] = &["hives", "hive_inspections", "honey_harvests"];

const INVENTORY: &[&str] = &["inventory_items", "equipment"];

const FULL: &[&str] = &[
    "garden_beds",
    "plantings",
    "seeds",
    "harvests",
    "herds",
    "animals",
    "breeding_records",
    "health_records",
    "feed_logs",
    "production_logs",
    "tasks",
    "notification_tasks",
    "transactions",
    "budgets",
    "invoices",
    "orchard_trees",
    "orchard_harvests",
    "hives",
    "hive_inspections",
    "honey_harvests",
    "inventory_items",
    "equipment",
    "journal_entries",
    "user_settings",
];

/// Error returned when parsing an unknown scope name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown scope '{0}' (expected one of: full, garden, livestock, tasks, finances, orchard, apiary, inventory)")]
pub struct UnknownScope(pub String);

/// Named subset of collections eligible for export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Full,
    Garden,
    Livestock,
    Tasks,
    Finances,
    Orchard,
    Apiary,
    Inventory,
}

impl Scope {
    pub const ALL: [Scope; 8] = [
        Scope::Full,
        Scope::Garden,
        Scope::Livestock,
        Scope::Tasks,
        Scope::Finances,
        Scope::Orchard,
        Scope::Apiary,
        Scope::Inventory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Full => "full",
            Scope::Garden => "garden",
            Scope::Livestock => "livestock",
            Scope::Tasks => "tasks",
            Scope::Finances => "finances",
            Scope::Orchard => "orchard",
            Scope::Apiary => "apiary",
            Scope::Inventory => "inventory",
        }
    }

    /// Collections covered by this scope, in registry order
    pub fn collections(&self) -> &'static [&'static str] {
        ScopeRegistry::collections(*self)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| UnknownScope(s.to_string()))
    }
}

/// Static scope → collection lookup
pub struct ScopeRegistry;

impl ScopeRegistry {
    /// Collections for a scope
    pub fn collections(scope: Scope) -> &'static [&'static str] {
        match scope {
            Scope::Full => FULL,
            Scope::Garden => GARDEN,
            Scope::Livestock => LIVESTOCK,
            Scope::Tasks => TASKS,
            Scope::Finances => FINANCES,
            Scope::Orchard => ORCHARD,
            Scope::Apiary => APIARY,
            Scope::Inventory => INVENTORY,
        }
    }

    /// Resolve a scope by name, falling back to the `full` list for unknown names
    ///
    /// Callers that need to reject bad input should parse a [`Scope`] first.
    pub fn resolve(name: &str) -> &'static [&'static str] {
        match name.parse::<Scope>() {
            Ok(scope) => Self::collections(scope),
            Err(_) => FULL,
        }
    }

    /// Every scope with its collections
    pub fn all_scopes() -> impl Iterator<Item = (Scope, &'static [&'static str])> {
        Scope::ALL
            .into_iter()
            .map(|scope| (scope, Self::collections(scope)))
    }

    /// Whether any scope exports this collection
    pub fn contains(collection: &str) -> bool {
        FULL.contains(&collection)
    }

    /// Collections the engine owns and never accepts from an import
    pub fn is_reserved(collection: &str) -> bool {
        collection == EXPORT_HISTORY_COLLECTION || collection == IMPORT_HISTORY_COLLECTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_scope_is_subset_of_full() {
        for (scope, collections) in ScopeRegistry::all_scopes() {
            for collection in collections {
                assert!(
                    FULL.contains(collection),
                    "{} in scope {} is missing from full",
                    collection,
                    scope
                );
            }
        }
    }

    #[test]
    fn test_no_duplicate_collections_in_full() {
        let unique: HashSet<&&str> = FULL.iter().collect();
        assert_eq!(unique.len(), FULL.len());
    }

    #[test]
    fn test_reserved_collections_are_never_exported() {
        for (_, collections) in ScopeRegistry::all_scopes() {
            assert!(!collections.iter().any(|c| ScopeRegistry::is_reserved(c)));
        }
    }

    #[test]
    fn test_tasks_scope_order() {
        assert_eq!(Scope::Tasks.collections(), ["tasks", "notification_tasks"]);
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_full() {
        assert_eq!(ScopeRegistry::resolve("marketplace"), FULL);
        assert_eq!(ScopeRegistry::resolve("garden"), GARDEN);
    }

    #[test]
    fn test_parse_and_display() {
        for scope in Scope::ALL {
            assert_eq!(scope.to_string().parse::<Scope>(), Ok(scope));
        }
        assert_eq!(
            "Garden".parse::<Scope>(),
            Err(UnknownScope("Garden".to_string()))
        );
    }

    #[test]
    fn test_contains() {
        assert!(ScopeRegistry::contains("animals"));
        assert!(!ScopeRegistry::contains("export_history"));
        assert!(!ScopeRegistry::contains("listings"));
    }
}
