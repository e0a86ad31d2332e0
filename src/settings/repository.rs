/// Home settings persistence
use crate::{
    error::{SiteError, SiteResult},
    settings::{HomeSettings, HomeSettingsWrite, HOME_SETTINGS_ID},
};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

/// Home settings repository
#[derive(Clone)]
pub struct HomeSettingsRepository {
    db: SqlitePool,
}

impl HomeSettingsRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Get the stored settings, if any have been saved yet
    pub async fn get(&self) -> SiteResult<Option<HomeSettings>> {
        let row = sqlx::query(
            r#"
            SELECT id, hero_headline, hero_subheadline, hero_images,
                   show_products_section, version, updated_at
            FROM home_settings
            WHERE id = ?1
            "#,
        )
        .bind(HOME_SETTINGS_ID)
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(row_to_settings).transpose()
    }

    /// Insert or update the settings row in one statement
    ///
    /// The row lives at a fixed id, so the first write inserts and every
    /// later write updates the same row. With `expected_version` set, a stale
    /// version leaves the row untouched and returns `Conflict`.
    pub async fn upsert(&self, write: &HomeSettingsWrite) -> SiteResult<HomeSettings> {
        let now = Utc::now();
        let images = serde_json::to_string(&write.hero_images)?;

        let row = sqlx::query(
            r#"
            INSERT INTO home_settings
                (id, hero_headline, hero_subheadline, hero_images,
                 show_products_section, version, updated_at)
            VALUES (?1, ?2, ?3, ?4, COALESCE(?5, 1), 1, ?6)
            ON CONFLICT(id) DO UPDATE SET
                hero_headline = excluded.hero_headline,
                hero_subheadline = excluded.hero_subheadline,
                hero_images = excluded.hero_images,
                show_products_section = COALESCE(?5, home_settings.show_products_section),
                version = home_settings.version + 1,
                updated_at = excluded.updated_at
            WHERE ?7 IS NULL OR home_settings.version = ?7
            RETURNING id, hero_headline, hero_subheadline, hero_images,
                      show_products_section, version, updated_at
            "#,
        )
        .bind(HOME_SETTINGS_ID)
        .bind(&write.hero_headline)
        .bind(&write.hero_subheadline)
        .bind(&images)
        .bind(write.show_products_section)
        .bind(now.to_rfc3339())
        .bind(write.expected_version)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            return Err(SiteError::Conflict(format!(
                "Home settings changed since version {}",
                write.expected_version.unwrap_or_default()
            )));
        };

        let settings = row_to_settings(&row)?;

        if settings.version == 1 {
            tracing::info!("Created home settings");
        } else {
            tracing::info!("Updated home settings to version {}", settings.version);
        }

        Ok(settings)
    }
}

fn row_to_settings(row: &SqliteRow) -> SiteResult<HomeSettings> {
    let images: String = row.try_get("hero_images")?;

    Ok(HomeSettings {
        id: row.try_get("id")?,
        hero_headline: row.try_get("hero_headline")?,
        hero_subheadline: row.try_get("hero_subheadline")?,
        hero_images: serde_json::from_str(&images)?,
        show_products_section: row.try_get("show_products_section")?,
        version: row.try_get("version")?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
    })
}

/// Parse RFC3339 timestamp
fn parse_timestamp(s: &str) -> SiteResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SiteError::Internal(format!("Invalid timestamp: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn create_test_repository() -> HomeSettingsRepository {
        HomeSettingsRepository::new(db::create_memory_pool().await.unwrap())
    }

    fn write(headline: &str, images: &[&str]) -> HomeSettingsWrite {
        HomeSettingsWrite {
            hero_headline: headline.to_string(),
            hero_subheadline: "Since 1987".to_string(),
            hero_images: images.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_before_first_save() {
        let repo = create_test_repository().await;
        assert!(repo.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_then_update_same_row() {
        let repo = create_test_repository().await;

        let created = repo.upsert(&write("First", &["a"])).await.unwrap();
        assert_eq!(created.id, HOME_SETTINGS_ID);
        assert_eq!(created.version, 1);
        assert!(created.show_products_section);

        let updated = repo.upsert(&write("Second", &["b", "a"])).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.version, 2);
        assert_eq!(updated.hero_images, vec!["b", "a"]);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM home_settings")
            .fetch_one(&repo.db)
            .await
            .unwrap();
        assert_eq!(count, 1);

        assert_eq!(repo.get().await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_product_toggle_kept_when_absent() {
        let repo = create_test_repository().await;

        let mut hidden = write("Hidden", &[]);
        hidden.show_products_section = Some(false);
        repo.upsert(&hidden).await.unwrap();

        let next = repo.upsert(&write("Still hidden", &[])).await.unwrap();
        assert!(!next.show_products_section);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let repo = create_test_repository().await;
        repo.upsert(&write("v1", &["a"])).await.unwrap();
        repo.upsert(&write("v2", &["a"])).await.unwrap();

        let mut stale = write("stale", &[]);
        stale.expected_version = Some(1);
        let result = repo.upsert(&stale).await;
        assert!(matches!(result, Err(SiteError::Conflict(_))));

        let stored = repo.get().await.unwrap().unwrap();
        assert_eq!(stored.hero_headline, "v2");
        assert_eq!(stored.version, 2);

        let mut current = write("v3", &[]);
        current.expected_version = Some(2);
        assert_eq!(repo.upsert(&current).await.unwrap().version, 3);
    }
}
