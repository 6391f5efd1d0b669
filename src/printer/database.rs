use std::collections::HashMap;
use std::path::Path;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::Error;
use crate::error::map_io_error;
use crate::ygopro::data::RawCardRow;

/// SQLite limits bound parameters per statement.
const MAX_BIND_PARAMETERS: usize = 500;

const SELECT_CARDS: &str = "SELECT t.id, t.name, d.type, d.atk, d.def, d.level, t.desc, d.race, d.attribute \
                            FROM texts t JOIN datas d ON t.id = d.id WHERE t.id IN";

#[derive(sqlx::FromRow)]
struct CardRecord {
    id: i64,
    name: Option<String>,
    #[sqlx(rename = "type")]
    type_mask: i64,
    atk: i64,
    def: i64,
    level: i64,
    desc: Option<String>,
    race: i64,
    attribute: i64,
}

impl From<CardRecord> for RawCardRow {
    fn from(record: CardRecord) -> Self {
        RawCardRow {
            id: record.id as u32,
            name: record.name.unwrap_or_default(),
            type_mask: record.type_mask as u32,
            attack: record.atk as i32,
            defense: record.def as i32,
            level: record.level as u32,
            description: record.desc.unwrap_or_default(),
            race_mask: record.race as u32,
            attribute_mask: record.attribute as u32,
        }
    }
}

/// Read only access to a ygopro `cards.cdb`.
pub struct CardDatabase {
    pool: SqlitePool
}

impl CardDatabase {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<CardDatabase, Error> {
        let path = path.as_ref();
        std::fs::metadata(path).map_err(map_io_error(path))?;
        let options = SqliteConnectOptions::new().filename(path).create_if_missing(false);
        let pool = SqlitePoolOptions::new().max_connections(1).connect_with(options).await?;
        Ok(CardDatabase { pool })
    }

    /// Look up every id in one pass.
    ///
    /// The answer has one slot per requested id, in the same order, repeated
    /// ids included. Ids that are not in the database are [`None`].
    pub async fn lookup(&self, ids: &[String]) -> Result<Vec<Option<RawCardRow>>, Error> {
        let mut codes: Vec<u32> = ids.iter().filter_map(|id| id.parse().ok()).collect();
        codes.sort_unstable();
        codes.dedup();
        debug!("Query {} cards from database.", codes.len());

        let mut rows = HashMap::new();
        for chunk in codes.chunks(MAX_BIND_PARAMETERS) {
            let sql = format!("{} ({})", SELECT_CARDS, vec!["?"; chunk.len()].join(", "));
            let mut query = sqlx::query_as::<_, CardRecord>(&sql);
            for code in chunk {
                query = query.bind(*code as i64);
            }
            for record in query.fetch_all(&self.pool).await? {
                let row = RawCardRow::from(record);
                rows.insert(row.id, row);
            }
        }

        Ok(ids.iter()
            .map(|id| id.parse::<u32>().ok().and_then(|code| rows.get(&code).cloned()))
            .collect())
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    /// In memory database with the ygopro `datas` / `texts` schema.
    pub async fn memory_database(rows: &[RawCardRow]) -> CardDatabase {
        let pool = SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();
        fill(&pool, rows).await;
        CardDatabase { pool }
    }

    /// Same as [`memory_database`] but written to `path`.
    pub async fn create_database(path: &Path, rows: &[RawCardRow]) {
        let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(1).connect_with(options).await.unwrap();
        fill(&pool, rows).await;
        pool.close().await;
    }

    async fn fill(pool: &SqlitePool, rows: &[RawCardRow]) {
        sqlx::query("CREATE TABLE datas(id integer primary key, ot integer, alias integer, setcode integer, type integer, atk integer, def integer, level integer, race integer, attribute integer, category integer)")
            .execute(pool).await.unwrap();
        sqlx::query("CREATE TABLE texts(id integer primary key, name text, desc text)")
            .execute(pool).await.unwrap();
        for row in rows {
            sqlx::query("INSERT INTO datas VALUES (?, 0, 0, 0, ?, ?, ?, ?, ?, ?, 0)")
                .bind(row.id as i64)
                .bind(row.type_mask as i64)
                .bind(row.attack as i64)
                .bind(row.defense as i64)
                .bind(row.level as i64)
                .bind(row.race_mask as i64)
                .bind(row.attribute_mask as i64)
                .execute(pool).await.unwrap();
            sqlx::query("INSERT INTO texts VALUES (?, ?, ?)")
                .bind(row.id as i64)
                .bind(row.name.clone())
                .bind(row.description.clone())
                .execute(pool).await.unwrap();
        }
    }

    pub fn dark_magician() -> RawCardRow {
        RawCardRow {
            id: 46986414,
            name: "黑魔术师".to_string(),
            type_mask: 0x11,
            attack: 2500,
            defense: 2100,
            level: 7,
            description: "Some monster text".to_string(),
            race_mask: 0x2,
            attribute_mask: 0x20,
        }
    }

    pub fn pot_of_greed() -> RawCardRow {
        RawCardRow {
            id: 55144522,
            name: "强欲之壶".to_string(),
            type_mask: 0x2,
            description: "Draw 2 cards.".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lookup_keeps_order() {
        let database = memory_database(&[dark_magician(), pot_of_greed()]).await;
        let ids = vec!["55144522".to_string(), "12345".to_string(), "46986414".to_string(), "55144522".to_string()];
        let rows = database.lookup(&ids).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], Some(pot_of_greed()));
        assert_eq!(rows[1], None);
        assert_eq!(rows[2], Some(dark_magician()));
        assert_eq!(rows[3], Some(pot_of_greed()));
    }

    #[tokio::test]
    async fn test_lookup_unparsable_id() {
        let database = memory_database(&[dark_magician()]).await;
        let rows = database.lookup(&["99999999999999999999".to_string()]).await.unwrap();
        assert_eq!(rows, vec![None]);
        assert!(database.lookup(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let directory = tempfile::tempdir().unwrap();
        let result = CardDatabase::open(directory.path().join("cards.cdb")).await;
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
