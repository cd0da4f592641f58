use sqlx::SqliteConnection;

/// Returns the raw JSON value stored under `key`, if any.
pub async fn fetch_setting(key: &str, conn: &mut SqliteConnection) -> Result<Option<String>, sqlx::Error> {
    let value: Option<(String,)> =
        sqlx::query_as("SELECT value FROM site_settings WHERE key = $1").bind(key).fetch_optional(conn).await?;
    Ok(value.map(|(v,)| v))
}

pub async fn upsert_setting(key: &str, value: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO site_settings (key, value, updated_at)
        VALUES ($1, $2, CURRENT_TIMESTAMP)
        ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}
