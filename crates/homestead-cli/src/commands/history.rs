//! History command handlers

use anyhow::Result;

use homestead_core::Store;

use crate::output::Output;

pub async fn exports(store: &Store, user: Option<&str>, output: &Output) -> Result<()> {
    let entries = store.export_history(user).await?;
    output.print_export_history(&entries);
    Ok(())
}

pub async fn imports(store: &Store, user: Option<&str>, output: &Output) -> Result<()> {
    let entries = store.import_history(user).await?;
    output.print_import_history(&entries);
    Ok(())
}
