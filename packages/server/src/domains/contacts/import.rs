//! CSV contact import.
//!
//! Expects a header row of `name,email,outlet,kind`. Rows with a missing
//! name/email or an unknown kind are skipped and counted, never aborting
//! the import.
//!
//! Imports are bulk inserts: unlike single-contact creation, they do not
//! fire the `contact_created` automation trigger or the `contact.created`
//! integration event per row, so a large import cannot flood rules or
//! webhook endpoints.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::warn;

use crate::common::UserId;
use crate::domains::contacts::models::{Contact, ContactKind, CreateContact};

#[derive(Debug, Deserialize)]
struct ImportRow {
    name: String,
    email: String,
    outlet: Option<String>,
    kind: String,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Parse CSV rows without touching the database. Returns valid inputs plus
/// the number of skipped rows.
pub fn parse_csv(data: &str) -> Result<(Vec<CreateContact>, usize)> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let mut rows = Vec::new();
    let mut skipped = 0;

    for record in reader.deserialize::<ImportRow>() {
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "Skipping malformed CSV row");
                skipped += 1;
                continue;
            }
        };

        if row.name.is_empty() || !row.email.contains('@') {
            skipped += 1;
            continue;
        }

        let kind: ContactKind = match row.kind.parse() {
            Ok(kind) => kind,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        rows.push(CreateContact {
            name: row.name,
            email: row.email,
            outlet: row.outlet.filter(|s| !s.is_empty()),
            contact_kind: kind,
            tags: Vec::new(),
            notes: None,
        });
    }

    Ok((rows, skipped))
}

/// Import parsed rows. Duplicate emails count as skipped.
pub async fn import_contacts(
    user_id: UserId,
    data: &str,
    pool: &PgPool,
) -> Result<ImportReport> {
    let (rows, mut skipped) = parse_csv(data)?;
    let mut imported = 0;

    for input in rows {
        match Contact::create(user_id, input, pool).await {
            Ok(_) => imported += 1,
            Err(e) => {
                warn!(error = %e, "Skipping contact row on insert failure");
                skipped += 1;
            }
        }
    }

    Ok(ImportReport { imported, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_csv() {
        let data = "name,email,outlet,kind\n\
                    Jo Curator,jo@lists.example,Fresh Finds Weekly,playlist_curator\n\
                    Sam Writer,sam@blog.example,The Needle Drop Off,blogger\n";
        let (rows, skipped) = parse_csv(data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(skipped, 0);
        assert_eq!(rows[0].name, "Jo Curator");
        assert_eq!(rows[1].contact_kind, ContactKind::Blogger);
    }

    #[test]
    fn test_parse_skips_bad_rows() {
        let data = "name,email,outlet,kind\n\
                    ,missing@name.example,,blogger\n\
                    No Email,not-an-email,,radio\n\
                    Bad Kind,ok@example.com,,trapeze_artist\n\
                    Good Row,good@example.com,KEXP,radio\n";
        let (rows, skipped) = parse_csv(data).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(skipped, 3);
        assert_eq!(rows[0].name, "Good Row");
    }

    #[test]
    fn test_parse_empty_input() {
        let (rows, skipped) = parse_csv("name,email,outlet,kind\n").unwrap();
        assert!(rows.is_empty());
        assert_eq!(skipped, 0);
    }
}
