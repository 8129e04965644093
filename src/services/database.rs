use crate::config::Config;
use crate::error::{AppError, Result};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::{debug, error, info, warn};

/// 数据库连接状态
#[derive(Debug, Clone, Serialize)]
pub struct DbStatus {
    pub connected: bool,
    pub error: Option<String>,
}

/// 数据库服务
///
/// 连接失败不会阻止服务启动；状态通过 `/api/db-status` 暴露，
/// 数据相关请求在未连接时返回 503。
#[derive(Clone)]
pub struct Database {
    client: Surreal<Any>,
    connected: Arc<AtomicBool>,
    last_error: Arc<RwLock<Option<String>>>,
}

impl Database {
    /// 创建新的数据库实例并尝试连接
    pub async fn new(config: &Config) -> Self {
        let db = Self {
            client: Surreal::init(),
            connected: Arc::new(AtomicBool::new(false)),
            last_error: Arc::new(RwLock::new(None)),
        };

        match db.connect(config).await {
            Ok(()) => {
                info!("Connected to database at {}", config.database_url);
                db.connected.store(true, Ordering::SeqCst);
            }
            Err(e) => {
                warn!(
                    "Database connection to {} failed, data routes will be unavailable: {}",
                    config.database_url, e
                );
                *db.last_error.write() = Some(e.to_string());
            }
        }

        db
    }

    async fn connect(&self, config: &Config) -> Result<()> {
        self.client.connect(config.database_url.as_str()).await?;

        if config.database_requires_signin() {
            self.client
                .signin(Root {
                    username: &config.database_username,
                    password: &config.database_password,
                })
                .await?;
        }

        self.client
            .use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        Ok(())
    }

    pub fn status(&self) -> DbStatus {
        DbStatus {
            connected: self.is_connected(),
            error: self.last_error.read().clone(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(AppError::unavailable(
                "Database is not connected. Please check the database configuration.",
            ))
        }
    }

    /// 执行带参数的查询，返回第一条语句的结果行
    async fn query_rows(&self, sql: &str, params: Value) -> Result<Vec<Value>> {
        self.ensure_connected()?;
        debug!("Executing query: {}", sql);

        let mut response = self.client.query(sql).bind(params).await?;
        let mut rows: Vec<Value> = response.take(0)?;
        rows.iter_mut().for_each(normalize_record_id);
        Ok(rows)
    }

    /// 列出表中所有记录，按创建时间倒序
    pub async fn list<T>(&self, table: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let rows = self
            .query_rows(
                "SELECT * FROM type::table($table) ORDER BY createdAt DESC",
                json!({ "table": table }),
            )
            .await?;
        decode_rows(rows)
    }

    /// 通过ID获取单个记录
    pub async fn get_by_id<T>(&self, table: &str, id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let rows = self
            .query_rows(
                "SELECT * FROM type::thing($table, $id)",
                json!({ "table": table, "id": id }),
            )
            .await?;
        first_row(rows)
    }

    /// 查找单个记录；`field` 只接受代码中的常量字段名
    pub async fn find_one<T>(&self, table: &str, field: &'static str, value: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let sql = format!(
            "SELECT * FROM type::table($table) WHERE {} = $value LIMIT 1",
            field
        );
        let rows = self
            .query_rows(&sql, json!({ "table": table, "value": value }))
            .await?;
        first_row(rows)
    }

    /// 创建记录，`id` 作为记录键
    pub async fn create<T, R>(&self, table: &str, id: &str, data: &T) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let content = document_content(data)?;
        let rows = self
            .query_rows(
                "CREATE type::thing($table, $id) CONTENT $content",
                json!({ "table": table, "id": id, "content": content }),
            )
            .await?;
        first_row(rows)?.ok_or_else(|| AppError::internal("Failed to create record"))
    }

    /// 合并更新记录，记录不存在时返回 None
    pub async fn merge<T, R>(&self, table: &str, id: &str, patch: &T) -> Result<Option<R>>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        if self.get_by_id::<Value>(table, id).await?.is_none() {
            return Ok(None);
        }

        let patch = document_content(patch)?;
        let rows = self
            .query_rows(
                "UPDATE type::thing($table, $id) MERGE $patch",
                json!({ "table": table, "id": id, "patch": patch }),
            )
            .await?;
        first_row(rows)
    }

    /// 删除记录并返回删除前的内容
    pub async fn delete_by_id<R>(&self, table: &str, id: &str) -> Result<Option<R>>
    where
        R: DeserializeOwned,
    {
        let rows = self
            .query_rows(
                "DELETE type::thing($table, $id) RETURN BEFORE",
                json!({ "table": table, "id": id }),
            )
            .await?;
        first_row(rows)
    }

    pub async fn count(&self, table: &str) -> Result<usize> {
        let rows = self
            .query_rows(
                "SELECT count() AS total FROM type::table($table) GROUP ALL",
                json!({ "table": table }),
            )
            .await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("total"))
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize)
    }
}

/// 记录内容不能包含 `id` 字段，它由记录键决定
fn document_content<T: Serialize>(data: &T) -> Result<Value> {
    let mut content = serde_json::to_value(data)?;
    match content.as_object_mut() {
        Some(object) => {
            object.remove("id");
            Ok(content)
        }
        None => Err(AppError::internal("Record content must be an object")),
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| {
                error!("Failed to deserialize record: {}", e);
                AppError::from(e)
            })
        })
        .collect()
}

fn first_row<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>> {
    Ok(decode_rows(rows)?.into_iter().next())
}

/// 把 SurrealDB 的记录ID（`table:id` 字符串或 `{tb, id: {String: ..}}` 对象）
/// 规范化为纯ID字符串
pub(crate) fn normalize_record_id(row: &mut Value) {
    let raw = match row.get("id") {
        Some(Value::String(s)) => match s.split_once(':') {
            Some((_, key)) => key.to_string(),
            None => return,
        },
        Some(Value::Object(thing)) => match thing.get("id") {
            Some(Value::Object(inner)) => match inner
                .get("String")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| inner.get("Number").map(|n| n.to_string()))
            {
                Some(key) => key,
                None => return,
            },
            Some(Value::String(key)) => key.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return,
        },
        _ => return,
    };

    let raw = raw
        .trim_start_matches('⟨')
        .trim_end_matches('⟩')
        .trim_matches('`')
        .to_string();
    row["id"] = Value::String(raw);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_thing_objects() {
        let mut row = json!({ "id": { "tb": "it_account", "id": { "String": "abc-123" } } });
        normalize_record_id(&mut row);
        assert_eq!(row["id"], "abc-123");
    }

    #[test]
    fn normalizes_prefixed_strings() {
        let mut row = json!({ "id": "department:⟨8d0c-11⟩" });
        normalize_record_id(&mut row);
        assert_eq!(row["id"], "8d0c-11");

        let mut numeric = json!({ "id": { "tb": "pc_laptop", "id": { "Number": 7 } } });
        normalize_record_id(&mut numeric);
        assert_eq!(numeric["id"], "7");
    }

    #[test]
    fn leaves_plain_ids_untouched() {
        let mut row = json!({ "id": "PC-0042" });
        normalize_record_id(&mut row);
        assert_eq!(row["id"], "PC-0042");
    }

    #[test]
    fn content_drops_id_field() {
        let content = document_content(&json!({ "id": "x", "name": "Finance" })).unwrap();
        assert_eq!(content, json!({ "name": "Finance" }));
        assert!(document_content(&json!([1, 2])).is_err());
    }

    #[tokio::test]
    async fn in_memory_database_round_trip() {
        let db = Database::new(&Config::default()).await;
        assert!(db.status().connected);

        let created: Value = db
            .create("department", "d1", &json!({ "name": "Finance", "createdAt": "2024-01-01T00:00:00Z" }))
            .await
            .unwrap();
        assert_eq!(created["id"], "d1");

        let found: Option<Value> = db.find_one("department", "name", "Finance").await.unwrap();
        assert_eq!(found.unwrap()["id"], "d1");
        assert_eq!(db.count("department").await.unwrap(), 1);

        let deleted: Option<Value> = db.delete_by_id("department", "d1").await.unwrap();
        assert!(deleted.is_some());
        assert!(db.get_by_id::<Value>("department", "d1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreachable_database_reports_status() {
        let config = Config {
            database_url: "unsupported://nowhere".to_string(),
            ..Config::default()
        };
        let db = Database::new(&config).await;
        let status = db.status();
        assert!(!status.connected);
        assert!(status.error.is_some());
        assert!(matches!(
            db.list::<Value>("it_account").await,
            Err(AppError::ServiceUnavailable(_))
        ));
    }
}
