use std::collections::HashMap;

use sqlx::{Row, SqliteConnection, SqliteExecutor};
use uuid::Uuid;

use crate::db::error::{DbError, DbResult};

/// Parse a UUID string from the database, returning a DbError on failure
pub fn parse_uuid(s: &str) -> DbResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DbError::Internal(format!("Invalid UUID in database: {}", e)))
}

pub fn parse_opt_uuid(s: Option<String>) -> DbResult<Option<Uuid>> {
    s.as_deref().map(parse_uuid).transpose()
}

/// Parse a text enum column with the type's `from_str`.
pub fn parse_enum<T>(value: &str, column: &str, parse: fn(&str) -> Option<T>) -> DbResult<T> {
    parse(value).ok_or_else(|| DbError::Internal(format!("Invalid {column} in database: {value}")))
}

/// `?, ?, ?` for an `IN (...)` list of `n` values.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Sort and deduplicate tag ids so link rows and API output agree.
pub fn normalize_tags(mut tags: Vec<Uuid>) -> Vec<Uuid> {
    tags.sort();
    tags.dedup();
    tags
}

/// Many-to-many link table between a record kind and tags.
pub struct TagLinks {
    pub table: &'static str,
    pub owner_column: &'static str,
}

pub const EXPERIENCE_TAGS: TagLinks = TagLinks {
    table: "experience_tags",
    owner_column: "experience_id",
};

pub const OPPORTUNITY_TAGS: TagLinks = TagLinks {
    table: "opportunity_tags",
    owner_column: "opportunity_id",
};

impl TagLinks {
    /// Tag ids per owner, each list sorted.
    pub async fn load<'e>(
        &self,
        executor: impl SqliteExecutor<'e>,
        owners: &[Uuid],
    ) -> DbResult<HashMap<Uuid, Vec<Uuid>>> {
        let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        if owners.is_empty() {
            return Ok(map);
        }

        let sql = format!(
            "SELECT {owner} AS owner_id, tag_id FROM {table} WHERE {owner} IN ({ids}) ORDER BY {owner}, tag_id",
            owner = self.owner_column,
            table = self.table,
            ids = placeholders(owners.len()),
        );
        let mut query = sqlx::query(&sql);
        for owner in owners {
            query = query.bind(owner.to_string());
        }

        for row in query.fetch_all(executor).await? {
            let owner = parse_uuid(&row.get::<String, _>("owner_id"))?;
            let tag = parse_uuid(&row.get::<String, _>("tag_id"))?;
            map.entry(owner).or_default().push(tag);
        }
        Ok(map)
    }

    /// Replace the full tag set of one owner. Callers run this inside the
    /// transaction that writes the owner row.
    pub async fn replace(
        &self,
        conn: &mut SqliteConnection,
        owner: Uuid,
        tags: &[Uuid],
    ) -> DbResult<()> {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE {} = ?",
            self.table, self.owner_column
        ))
        .bind(owner.to_string())
        .execute(&mut *conn)
        .await?;

        let insert = format!(
            "INSERT INTO {} ({}, tag_id) VALUES (?, ?)",
            self.table, self.owner_column
        );
        for tag in tags {
            sqlx::query(&insert)
                .bind(owner.to_string())
                .bind(tag.to_string())
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    DbError::from_write(e, "Duplicate tag", &format!("Tag {tag} does not exist"))
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_normalize_tags() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let tags = normalize_tags(vec![b, a, b]);
        assert_eq!(tags.len(), 2);
        assert!(tags.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parse_enum() {
        use crate::models::Role;
        assert_eq!(parse_enum("pr", "role", Role::from_str).unwrap(), Role::Pr);
        assert!(matches!(
            parse_enum("owner", "role", Role::from_str),
            Err(DbError::Internal(_))
        ));
    }
}
