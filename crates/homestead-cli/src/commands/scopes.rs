//! Scope and strategy listings

use anyhow::Result;

use homestead_core::{ConflictStrategy, ScopeRegistry};

use crate::output::{Output, OutputFormat};

/// List every scope with its collections
pub fn list(output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            let scopes: serde_json::Map<String, serde_json::Value> = ScopeRegistry::all_scopes()
                .map(|(scope, collections)| (scope.to_string(), collections.into()))
                .collect();
            output.json(&scopes);
        }
        OutputFormat::Quiet => {
            for (scope, _) in ScopeRegistry::all_scopes() {
                println!("{}", scope);
            }
        }
        OutputFormat::Human => {
            for (scope, collections) in ScopeRegistry::all_scopes() {
                println!("{:<10} {}", scope.as_str(), collections.join(", "));
            }
        }
    }
    Ok(())
}

/// Describe the conflict strategies
pub fn strategies(output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            let strategies: Vec<_> = ConflictStrategy::ALL
                .iter()
                .map(|s| serde_json::json!({"name": s.as_str(), "description": s.description()}))
                .collect();
            output.json(&strategies);
        }
        OutputFormat::Quiet => {
            for strategy in ConflictStrategy::ALL {
                println!("{}", strategy);
            }
        }
        OutputFormat::Human => {
            for strategy in ConflictStrategy::ALL {
                println!("{:<10} {}", strategy.as_str(), strategy.description());
            }
        }
    }
    Ok(())
}
