//! Record command handlers

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

use homestead_core::models::{now_millis, CREATED_AT_FIELD};
use homestead_core::{Record, Store};

use crate::output::Output;

/// Insert or replace a record
///
/// `createdAt` is filled in when missing; `updatedAt` and `syncStatus` are
/// always stamped.
pub async fn put(store: &Store, collection: &str, json: &str, output: &Output) -> Result<()> {
    let value: Value = serde_json::from_str(json).context("Record is not valid JSON")?;
    let mut record = Record::from_value(value)?;

    let now = now_millis();
    if record.created_at().is_none() {
        record.set(CREATED_AT_FIELD, now);
    }
    record.stamp_pending(now);

    store.put_record(collection, &record).await?;

    output.success(&format!("Saved {} in {}", record.id(), collection));
    Ok(())
}

/// Show one record
pub async fn get(store: &Store, collection: &str, id: &str, output: &Output) -> Result<()> {
    let record = store
        .get_record(collection, id)
        .await?
        .ok_or_else(|| anyhow!("Record not found: {}/{}", collection, id))?;

    output.print_record(&record);
    Ok(())
}

/// List a collection, optionally filtered by `FIELD=VALUE`
pub async fn list(
    store: &Store,
    collection: &str,
    filter: Option<&str>,
    output: &Output,
) -> Result<()> {
    let records = match filter {
        Some(filter) => {
            let (field, value) = parse_filter(filter)?;
            store.list_records_where(collection, field, &value).await?
        }
        None => store.list_records(collection).await?,
    };

    output.print_records(collection, &records);
    Ok(())
}

/// Delete a record
pub async fn delete(store: &Store, collection: &str, id: &str, output: &Output) -> Result<()> {
    if !store.delete_record(collection, id).await? {
        bail!("Record not found: {}/{}", collection, id);
    }

    output.success(&format!("Deleted {} from {}", id, collection));
    Ok(())
}

/// Split `FIELD=VALUE`; the value is read as JSON when it parses, else as a string
fn parse_filter(filter: &str) -> Result<(&str, Value)> {
    let (field, raw) = filter
        .split_once('=')
        .ok_or_else(|| anyhow!("Filter must look like FIELD=VALUE, got '{}'", filter))?;
    if field.is_empty() {
        bail!("Filter field cannot be empty");
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((field, value))
}
