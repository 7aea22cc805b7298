use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{ContactId, UserId};

/// Contact kind enum for type-safe querying
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    PlaylistCurator,
    Blogger,
    Radio,
    Press,
    Venue,
    Influencer,
}

impl std::fmt::Display for ContactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactKind::PlaylistCurator => write!(f, "playlist_curator"),
            ContactKind::Blogger => write!(f, "blogger"),
            ContactKind::Radio => write!(f, "radio"),
            ContactKind::Press => write!(f, "press"),
            ContactKind::Venue => write!(f, "venue"),
            ContactKind::Influencer => write!(f, "influencer"),
        }
    }
}

impl std::str::FromStr for ContactKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "playlist_curator" => Ok(ContactKind::PlaylistCurator),
            "blogger" => Ok(ContactKind::Blogger),
            "radio" => Ok(ContactKind::Radio),
            "press" => Ok(ContactKind::Press),
            "venue" => Ok(ContactKind::Venue),
            "influencer" => Ok(ContactKind::Influencer),
            _ => Err(anyhow::anyhow!("Invalid contact kind: {}", s)),
        }
    }
}

/// Contact status enum - where the relationship stands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    New,
    Contacted,
    Responded,
    Engaged,
    Unsubscribed,
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactStatus::New => write!(f, "new"),
            ContactStatus::Contacted => write!(f, "contacted"),
            ContactStatus::Responded => write!(f, "responded"),
            ContactStatus::Engaged => write!(f, "engaged"),
            ContactStatus::Unsubscribed => write!(f, "unsubscribed"),
        }
    }
}

impl std::str::FromStr for ContactStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "new" => Ok(ContactStatus::New),
            "contacted" => Ok(ContactStatus::Contacted),
            "responded" => Ok(ContactStatus::Responded),
            "engaged" => Ok(ContactStatus::Engaged),
            "unsubscribed" => Ok(ContactStatus::Unsubscribed),
            _ => Err(anyhow::anyhow!("Invalid contact status: {}", s)),
        }
    }
}

/// A promo target: playlist curator, blogger, radio host, press, venue.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub id: ContactId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    /// The blog, playlist, station, or outlet this contact represents
    pub outlet: Option<String>,
    pub contact_kind: String,
    pub status: String,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new contact
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContact {
    pub name: String,
    pub email: String,
    pub outlet: Option<String>,
    pub contact_kind: ContactKind,
    #[serde(default)]
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

/// Partial update - absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub outlet: Option<String>,
    pub contact_kind: Option<ContactKind>,
    pub status: Option<ContactStatus>,
    pub notes: Option<String>,
}

/// List filters, all optional and combined with AND
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactFilters {
    pub status: Option<ContactStatus>,
    pub kind: Option<ContactKind>,
    pub tag: Option<String>,
    /// Free-text search over name, outlet, and email
    pub search: Option<String>,
}

/// Audience selection for a campaign
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudienceFilter {
    #[serde(default)]
    pub kinds: Vec<ContactKind>,
    #[serde(default)]
    pub statuses: Vec<ContactStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Contact {
    /// Find contact by ID, scoped to its owner
    pub async fn find_by_id(id: ContactId, user_id: UserId, pool: &PgPool) -> Result<Self> {
        let contact =
            sqlx::query_as::<_, Self>("SELECT * FROM contacts WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(contact)
    }

    /// Create a new contact. Duplicate (user_id, email) is a unique
    /// violation surfaced to the handler as a conflict.
    pub async fn create(user_id: UserId, input: CreateContact, pool: &PgPool) -> Result<Self> {
        let contact = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO contacts (id, user_id, name, email, outlet, contact_kind, tags, notes)
            VALUES ($1, $2, $3, lower($4), $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(ContactId::new())
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.outlet)
        .bind(input.contact_kind.to_string())
        .bind(&input.tags)
        .bind(&input.notes)
        .fetch_one(pool)
        .await?;
        Ok(contact)
    }

    /// List contacts for a user with filters, newest first, cursor-paginated.
    /// Fetches `limit + 1` rows so the caller can detect another page.
    pub async fn list(
        user_id: UserId,
        filters: &ContactFilters,
        after: Option<Uuid>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let contacts = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM contacts
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR id < $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::text IS NULL OR contact_kind = $4)
              AND ($5::text IS NULL OR $5 = ANY(tags))
              AND ($6::text IS NULL OR name ILIKE '%' || $6 || '%'
                   OR outlet ILIKE '%' || $6 || '%'
                   OR email ILIKE '%' || $6 || '%')
            ORDER BY id DESC
            LIMIT $7
            "#,
        )
        .bind(user_id)
        .bind(after)
        .bind(filters.status.map(|s| s.to_string()))
        .bind(filters.kind.map(|k| k.to_string()))
        .bind(&filters.tag)
        .bind(&filters.search)
        .bind(limit + 1)
        .fetch_all(pool)
        .await?;
        Ok(contacts)
    }

    /// Update a contact (only provided fields)
    pub async fn update(
        id: ContactId,
        user_id: UserId,
        input: UpdateContact,
        pool: &PgPool,
    ) -> Result<Self> {
        let contact = sqlx::query_as::<_, Self>(
            r#"
            UPDATE contacts
            SET name = COALESCE($3, name),
                email = COALESCE(lower($4), email),
                outlet = COALESCE($5, outlet),
                contact_kind = COALESCE($6, contact_kind),
                status = COALESCE($7, status),
                notes = COALESCE($8, notes),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(input.name)
        .bind(input.email)
        .bind(input.outlet)
        .bind(input.contact_kind.map(|k| k.to_string()))
        .bind(input.status.map(|s| s.to_string()))
        .bind(input.notes)
        .fetch_one(pool)
        .await?;
        Ok(contact)
    }

    /// Delete a contact. Idempotent: deleting a missing row is a no-op.
    pub async fn delete(id: ContactId, user_id: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM contacts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Add a tag (no duplicates)
    pub async fn add_tag(id: ContactId, user_id: UserId, tag: &str, pool: &PgPool) -> Result<Self> {
        let contact = sqlx::query_as::<_, Self>(
            r#"
            UPDATE contacts
            SET tags = array_append(tags, $3), updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND NOT ($3 = ANY(tags))
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(tag)
        .fetch_optional(pool)
        .await?;

        // Already tagged - return the current row
        match contact {
            Some(contact) => Ok(contact),
            None => Self::find_by_id(id, user_id, pool).await,
        }
    }

    /// Remove a tag
    pub async fn remove_tag(
        id: ContactId,
        user_id: UserId,
        tag: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        let contact = sqlx::query_as::<_, Self>(
            r#"
            UPDATE contacts
            SET tags = array_remove(tags, $3), updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(tag)
        .fetch_one(pool)
        .await?;
        Ok(contact)
    }

    /// Resolve a campaign audience: contacts matching any of the filter's
    /// kinds/statuses/tags (empty lists match everything), always excluding
    /// unsubscribed contacts.
    pub async fn find_audience(
        user_id: UserId,
        filter: &AudienceFilter,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let kinds: Vec<String> = filter.kinds.iter().map(|k| k.to_string()).collect();
        let statuses: Vec<String> = filter.statuses.iter().map(|s| s.to_string()).collect();

        let contacts = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM contacts
            WHERE user_id = $1
              AND status <> 'unsubscribed'
              AND (cardinality($2::text[]) = 0 OR contact_kind = ANY($2))
              AND (cardinality($3::text[]) = 0 OR status = ANY($3))
              AND (cardinality($4::text[]) = 0 OR tags && $4)
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .bind(&kinds)
        .bind(&statuses)
        .bind(&filter.tags)
        .fetch_all(pool)
        .await?;
        Ok(contacts)
    }

    /// Stamp last_contacted_at and move new contacts to contacted.
    pub async fn mark_contacted(ids: &[ContactId], pool: &PgPool) -> Result<()> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        sqlx::query(
            r#"
            UPDATE contacts
            SET last_contacted_at = NOW(),
                status = CASE WHEN status = 'new' THEN 'contacted' ELSE status END,
                updated_at = NOW()
            WHERE id = ANY($1)
            "#,
        )
        .bind(&uuids)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Set a status directly (automation actions, unsubscribe handling)
    pub async fn set_status(
        id: ContactId,
        status: ContactStatus,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query("UPDATE contacts SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.to_string())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// The parsed status enum for this row.
    pub fn status_enum(&self) -> Result<ContactStatus> {
        self.status.parse()
    }
}
