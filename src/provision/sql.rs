//! SQL script emission for the `"User"` table.

use std::fmt::Write;

use crate::error::StoreError;
use crate::store::UserRecord;

/// Renders a transaction of `INSERT` statements for `records`.
pub fn render_insert_script(records: &[UserRecord]) -> Result<String, StoreError> {
    let mut out = String::new();
    out.push_str("-- PSX Users Setup Script\n");
    out.push_str("-- Run: psql -d your_database -f insert_users.sql\n\n");
    out.push_str("BEGIN;\n\n");

    for record in records {
        let metadata = record.metadata_json()?;
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "INSERT INTO \"User\" (id, identifier, metadata, \"createdAt\", \"updatedAt\")\nVALUES ({}, {}, {}, {}, {});",
            quote(&record.id),
            quote(&record.identifier),
            quote(&metadata),
            quote(&record.created_at),
            quote(&record.updated_at),
        );
    }

    out.push_str("\nCOMMIT;\n");
    Ok(out)
}

/// SQL string literal with embedded single quotes doubled.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
