use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{TemplateId, UserId};
use crate::domains::templates::render;

/// A reusable pitch email template. Body is markdown with `{{variable}}`
/// placeholders; the variable list is derived on every write.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmailTemplate {
    pub id: TemplateId,
    pub user_id: UserId,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub variables: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

impl EmailTemplate {
    /// Find template by ID, scoped to its owner
    pub async fn find_by_id(id: TemplateId, user_id: UserId, pool: &PgPool) -> Result<Self> {
        let template =
            sqlx::query_as::<_, Self>("SELECT * FROM email_templates WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(template)
    }

    /// Create a new template
    pub async fn create(user_id: UserId, input: CreateTemplate, pool: &PgPool) -> Result<Self> {
        let variables = detect_variables(&input.subject, &input.body);
        let template = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO email_templates (id, user_id, name, subject, body, variables)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(TemplateId::new())
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.subject)
        .bind(&input.body)
        .bind(&variables)
        .fetch_one(pool)
        .await?;
        Ok(template)
    }

    /// List templates for a user, newest first, cursor-paginated
    pub async fn list(
        user_id: UserId,
        after: Option<Uuid>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let templates = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM email_templates
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR id < $2)
            ORDER BY id DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(after)
        .bind(limit + 1)
        .fetch_all(pool)
        .await?;
        Ok(templates)
    }

    /// Update a template; the variable list is re-derived from the
    /// effective subject and body.
    pub async fn update(
        id: TemplateId,
        user_id: UserId,
        input: UpdateTemplate,
        pool: &PgPool,
    ) -> Result<Self> {
        let current = Self::find_by_id(id, user_id, pool).await?;
        let subject = input.subject.unwrap_or(current.subject);
        let body = input.body.unwrap_or(current.body);
        let variables = detect_variables(&subject, &body);

        let template = sqlx::query_as::<_, Self>(
            r#"
            UPDATE email_templates
            SET name = COALESCE($3, name),
                subject = $4,
                body = $5,
                variables = $6,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(input.name)
        .bind(&subject)
        .bind(&body)
        .bind(&variables)
        .fetch_one(pool)
        .await?;
        Ok(template)
    }

    /// Delete a template. Idempotent.
    pub async fn delete(id: TemplateId, user_id: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM email_templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// Distinct variables across subject and body, subject first.
fn detect_variables(subject: &str, body: &str) -> Vec<String> {
    let mut variables = render::extract_variables(subject);
    for name in render::extract_variables(body) {
        if !variables.contains(&name) {
            variables.push(name);
        }
    }
    variables
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_variables_across_subject_and_body() {
        let variables = detect_variables(
            "{{artist}} has a new single",
            "Hi {{contact_name}}, {{artist}} just dropped {{track_name}}.",
        );
        assert_eq!(variables, vec!["artist", "contact_name", "track_name"]);
    }
}
