//! Phishing attempt model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// A stored phishing attempt. `details` is an open-ended JSON object;
/// whatever the reporter stored is passed through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PhishingAttempt {
    pub id: Uuid,
    pub category: Option<String>,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

/// The response projection: record id merged with all stored fields.
/// Serializes as `{ "id": ..., ...storedFields }` with stable key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One snapshot's worth of projected records, in store order.
pub type NotificationBatch = Vec<AttemptRecord>;

#[derive(Debug, Deserialize)]
pub struct ReportAttempt {
    pub category: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AttemptFilter {
    pub category: Option<String>,
}

impl AttemptFilter {
    pub fn for_category(category: Option<String>) -> Self {
        Self { category }
    }

    /// The effective filter value. An absent or empty `category` means
    /// "all records".
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }
}

impl PhishingAttempt {
    pub async fn create(pool: &PgPool, data: ReportAttempt) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PhishingAttempt>(
            r#"
            INSERT INTO phishing_attempts (category, details)
            VALUES ($1, $2)
            RETURNING *
            "#
        )
        .bind(&data.category)
        .bind(Value::Object(data.details))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PhishingAttempt>("SELECT * FROM phishing_attempts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List attempts matching the filter, in stable store order.
    pub async fn list(pool: &PgPool, filter: &AttemptFilter) -> Result<Vec<Self>, sqlx::Error> {
        match filter.category() {
            Some(category) => {
                sqlx::query_as::<_, PhishingAttempt>(
                    r#"
                    SELECT * FROM phishing_attempts
                    WHERE category = $1
                    ORDER BY created_at, id
                    "#
                )
                .bind(category)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, PhishingAttempt>(
                    "SELECT * FROM phishing_attempts ORDER BY created_at, id"
                )
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Project this row into the response record shape: id plus every
    /// stored field. Column values win over colliding `details` keys.
    pub fn project(&self) -> AttemptRecord {
        let mut fields = match &self.details {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        if let Some(category) = &self.category {
            fields.insert("category".to_string(), Value::String(category.clone()));
        }
        fields.insert(
            "created_at".to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );

        AttemptRecord {
            id: self.id,
            fields,
        }
    }
}

/// Project a full snapshot, preserving store order.
pub fn project_all(attempts: &[PhishingAttempt]) -> NotificationBatch {
    attempts.iter().map(PhishingAttempt::project).collect()
}
