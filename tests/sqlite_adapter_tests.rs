#![cfg(feature = "sqlite")]

use dbshift::models::migration::parse_timestamp;
use dbshift::{
    Adapter, AdapterState, Column, ColumnType, ConnectionConfig, DatabaseOptions, DbError,
    DefaultValue, Dialect, Direction, ForeignKey, Index, Migration, SchemaAdapter, Table,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

async fn memory_adapter() -> Adapter {
    init_logger();
    let mut adapter = Adapter::new(ConnectionConfig::sqlite_memory());
    adapter.connect().await.unwrap();
    adapter
}

fn posts() -> Table {
    Table::new("posts")
        .column(Column::new("title", ColumnType::String).null(true))
        .column(Column::new("body", ColumnType::Text).null(true))
        .column(Column::new("views", ColumnType::Integer).default_value(0i64))
        .index(Index::new(["title"]))
}

struct Step {
    version: i64,
    name: &'static str,
}

impl Migration for Step {
    fn version(&self) -> i64 {
        self.version
    }

    fn name(&self) -> &str {
        self.name
    }
}

#[tokio::test]
async fn test_connect_bootstraps_version_table() {
    let adapter = memory_adapter().await;

    assert_eq!(adapter.state(), AdapterState::Ready);
    assert!(adapter.has_schema_table().await.unwrap());
    assert!(adapter.has_table("SCHEMA_VERSIONS").await.unwrap());
    assert!(adapter.get_versions().await.unwrap().is_empty());
    assert!(adapter.has_database("main").await.unwrap());
}

#[tokio::test]
async fn test_table_lifecycle() {
    let adapter = memory_adapter().await;
    adapter.create_table(posts()).await.unwrap();

    assert!(adapter.has_table("posts").await.unwrap());
    assert!(adapter.has_column("posts", "Title").await.unwrap());
    assert!(!adapter.has_column("posts", "author").await.unwrap());
    assert!(adapter.has_index("posts", &["title"]).await.unwrap());
    assert!(adapter.describe_table("posts").await.unwrap().is_some());

    let columns = adapter.get_columns("posts").await.unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "title", "body", "views"]);
    assert!(columns[0].identity);
    assert!(!columns[0].null);
    assert_eq!(columns[1].column_type, ColumnType::String);
    assert!(columns[1].null);
    assert_eq!(columns[2].column_type, ColumnType::Text);
    assert_eq!(columns[3].default, Some(DefaultValue::Numeric("0".to_string())));

    adapter
        .add_column("posts", &Column::new("slug", ColumnType::String).limit(80).null(true))
        .await
        .unwrap();
    adapter.rename_column("posts", "slug", "permalink").await.unwrap();
    assert!(adapter.has_column("posts", "permalink").await.unwrap());
    assert!(!adapter.has_column("posts", "slug").await.unwrap());

    adapter.drop_column("posts", "permalink").await.unwrap();
    assert!(!adapter.has_column("posts", "permalink").await.unwrap());

    adapter.rename_table("posts", "articles").await.unwrap();
    assert!(!adapter.has_table("posts").await.unwrap());
    assert!(adapter.has_table("articles").await.unwrap());

    adapter.drop_table("articles").await.unwrap();
    assert!(!adapter.has_table("articles").await.unwrap());
}

#[tokio::test]
async fn test_rename_missing_column_fails() {
    let adapter = memory_adapter().await;
    adapter.create_table(posts()).await.unwrap();

    assert!(matches!(
        adapter.rename_column("posts", "missing", "other").await,
        Err(DbError::ColumnNotFound { .. })
    ));
}

#[tokio::test]
async fn test_indexes_by_columns_and_name() {
    let adapter = memory_adapter().await;
    adapter.create_table(posts()).await.unwrap();
    adapter
        .add_index("posts", &Index::new(["body", "views"]).unique(true))
        .await
        .unwrap();

    let indexes = adapter.get_indexes("posts").await.unwrap();
    assert!(indexes["posts_body_views"].unique);
    assert!(!indexes["posts_title"].unique);
    assert!(adapter.has_index("posts", &["VIEWS", "body"]).await.unwrap());

    adapter.drop_index("posts", &["views", "body"]).await.unwrap();
    assert!(!adapter.has_index("posts", &["views"]).await.unwrap());

    adapter.drop_index_by_name("posts", "posts_title").await.unwrap();
    adapter.drop_index_by_name("posts", "posts_title").await.unwrap();
    assert!(adapter.get_indexes("posts").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_foreign_keys_declared_at_create_time() {
    let adapter = memory_adapter().await;
    adapter.create_table(posts()).await.unwrap();
    let comments = Table::new("comments")
        .column(Column::new("post_id", ColumnType::Integer))
        .column(Column::new("body", ColumnType::Text))
        .foreign_key(ForeignKey::new(["post_id"], "posts", ["id"]).unwrap());
    adapter.create_table(comments).await.unwrap();

    let keys = adapter.get_foreign_keys("comments").await.unwrap();
    let key = &keys["comments_fk_0"];
    assert_eq!(key.columns(), ["post_id"]);
    assert_eq!(key.referenced_table(), "posts");
    assert!(adapter
        .has_foreign_key("comments", &["POST_ID"], None)
        .await
        .unwrap());
    assert!(!adapter
        .has_foreign_key("comments", &["body"], None)
        .await
        .unwrap());

    let result = adapter
        .add_foreign_key("comments", &ForeignKey::new(["body"], "posts", ["title"]).unwrap())
        .await;
    assert!(matches!(
        result,
        Err(DbError::UnsupportedOperation { dialect: "sqlite", .. })
    ));
}

#[tokio::test]
async fn test_unsupported_operations_leave_schema_alone() {
    let adapter = memory_adapter().await;
    adapter.create_table(posts()).await.unwrap();

    let change = adapter
        .change_column("posts", "title", &Column::new("title", ColumnType::Text))
        .await;
    assert!(matches!(change, Err(DbError::UnsupportedOperation { .. })));
    assert_eq!(
        adapter.get_columns("posts").await.unwrap()[1].column_type,
        ColumnType::String
    );

    assert!(matches!(
        adapter
            .create_database("other", &DatabaseOptions::default())
            .await,
        Err(DbError::UnsupportedOperation { .. })
    ));
    assert!(matches!(
        adapter.drop_database("other").await,
        Err(DbError::UnsupportedOperation { .. })
    ));
}

#[tokio::test]
async fn test_rollback_discards_schema_changes() {
    let adapter = memory_adapter().await;
    assert!(adapter.has_transactions());

    adapter.begin_transaction().await.unwrap();
    adapter.create_table(posts()).await.unwrap();
    assert!(adapter.has_table("posts").await.unwrap());
    adapter.rollback_transaction().await.unwrap();
    assert!(!adapter.has_table("posts").await.unwrap());

    adapter.begin_transaction().await.unwrap();
    adapter.create_table(posts()).await.unwrap();
    adapter.commit_transaction().await.unwrap();
    assert!(adapter.has_table("posts").await.unwrap());
}

#[tokio::test]
async fn test_version_tracking() {
    let adapter = memory_adapter().await;
    let start = parse_timestamp("2024-03-01 12:00:00").unwrap();
    let end = parse_timestamp("2024-03-01 12:00:03").unwrap();
    let first = Step {
        version: 20240301120000,
        name: "CreatePosts",
    };
    let second = Step {
        version: 20240302090000,
        name: "AddSlugToPosts",
    };

    adapter.migrated(&second, Direction::Up, start, end).await.unwrap();
    adapter.migrated(&first, Direction::Up, start, end).await.unwrap();
    assert_eq!(
        adapter.get_versions().await.unwrap(),
        vec![20240301120000, 20240302090000]
    );

    adapter.toggle_breakpoint(20240302090000).await.unwrap();
    let log = adapter.get_version_log().await.unwrap();
    assert_eq!(log[0].migration_name.as_deref(), Some("CreatePosts"));
    assert_eq!(log[0].start_time, Some(start));
    assert_eq!(log[0].end_time, Some(end));
    assert!(!log[0].breakpoint);
    assert!(log[1].breakpoint);

    assert_eq!(adapter.reset_all_breakpoints().await.unwrap(), 1);
    assert_eq!(adapter.reset_all_breakpoints().await.unwrap(), 0);

    adapter.migrated(&second, Direction::Down, start, end).await.unwrap();
    assert_eq!(adapter.get_versions().await.unwrap(), vec![20240301120000]);
}

#[tokio::test]
async fn test_file_database_survives_reconnect() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.sqlite3");
    let config = ConnectionConfig::new(Dialect::Sqlite, path.to_string_lossy().to_string());
    let stamp = parse_timestamp("2024-03-01 12:00:00").unwrap();

    let mut adapter = Adapter::new(config.clone());
    adapter.connect().await.unwrap();
    adapter.create_table(posts()).await.unwrap();
    adapter
        .migrated(
            &Step {
                version: 20240301120000,
                name: "CreatePosts",
            },
            Direction::Up,
            stamp,
            stamp,
        )
        .await
        .unwrap();
    adapter.disconnect().await.unwrap();
    assert!(matches!(
        adapter.get_versions().await,
        Err(DbError::NotConnected)
    ));

    let mut reopened = Adapter::new(config);
    reopened.connect().await.unwrap();
    assert!(reopened.has_table("posts").await.unwrap());
    assert_eq!(reopened.get_versions().await.unwrap(), vec![20240301120000]);
}

#[tokio::test]
async fn test_fetch_all_decodes_typed_columns() {
    let adapter = memory_adapter().await;
    adapter
        .create_table(
            Table::new("readings")
                .column(Column::new("count", ColumnType::Integer))
                .column(Column::new("taken_at", ColumnType::Timestamp))
                .column(Column::new("price", ColumnType::Decimal).precision(10, 2))
                .column(Column::new("note", ColumnType::String).null(true)),
        )
        .await
        .unwrap();
    adapter
        .execute(
            "INSERT INTO \"readings\" (\"count\", \"taken_at\", \"price\") \
             VALUES (7, '2024-01-01 10:00:00', 12.5)",
        )
        .await
        .unwrap();

    let rows = adapter
        .fetch_all("SELECT \"count\", \"taken_at\", \"price\", \"note\" FROM \"readings\"")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.get_i64("count"), Some(7));
    assert_eq!(row.get_str("taken_at").as_deref(), Some("2024-01-01 10:00:00"));
    assert_eq!(row.get_str("price").as_deref(), Some("12.5"));
    assert_eq!(row.get("note"), Some(&serde_json::Value::Null));
}
