//! Runs against real servers. Set `DATABASE_URL` (PostgreSQL) and/or
//! `MYSQL_URL`, then `cargo test -- --ignored`.

use std::env;

use dbshift::models::migration::parse_timestamp;
use dbshift::{
    Adapter, Column, ColumnType, ConnectionConfig, DefaultValue, Direction, ForeignKey,
    ForeignKeyAction, Index, Migration, SchemaAdapter, Table,
};

async fn connect(variable: &str) -> Option<Adapter> {
    dotenv::dotenv().ok();
    let _ = env_logger::builder().is_test(true).try_init();
    let Ok(url) = env::var(variable) else {
        eprintln!("{} is not set, skipping", variable);
        return None;
    };
    let config = ConnectionConfig::from_url(&url).expect("invalid database url");
    let mut adapter = Adapter::new(config);
    adapter.connect().await.expect("failed to connect");
    Some(adapter)
}

async fn reset(adapter: &Adapter) {
    for table in ["live_orders", "live_customers"] {
        adapter
            .execute(&format!("DROP TABLE IF EXISTS {}", adapter.quote_table_name(table)))
            .await
            .unwrap();
    }
}

fn customers() -> Table {
    Table::new("live_customers")
        .column(Column::new("email", ColumnType::String).limit(120))
        .column(Column::new("active", ColumnType::Boolean).default_value(true))
        .index(Index::new(["email"]).unique(true))
}

fn orders() -> Table {
    Table::new("live_orders")
        .column(Column::new("customer_id", ColumnType::Integer).signed(false))
        .column(Column::new("total", ColumnType::Decimal).precision(10, 2))
        .foreign_key(
            ForeignKey::new(["customer_id"], "live_customers", ["id"])
                .unwrap()
                .constraint("live_orders_customer")
                .on_delete(ForeignKeyAction::Cascade),
        )
}

struct LiveMigration;

impl Migration for LiveMigration {
    fn version(&self) -> i64 {
        19700101000001
    }

    fn name(&self) -> &str {
        "LiveMigration"
    }
}

async fn read_typed_cells(adapter: &Adapter) {
    let table = adapter.quote_table_name("live_readings");
    adapter
        .execute(&format!("DROP TABLE IF EXISTS {}", table))
        .await
        .unwrap();
    adapter
        .create_table(
            Table::new("live_readings")
                .column(Column::new("small", ColumnType::Integer))
                .column(Column::new("ratio", ColumnType::Float))
                .column(Column::new("price", ColumnType::Decimal).precision(10, 2))
                .column(Column::new("taken_at", ColumnType::DateTime))
                .column(Column::new("taken_on", ColumnType::Date)),
        )
        .await
        .unwrap();
    adapter
        .execute(&format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}) \
             VALUES (-7, 0.5, 12.50, '2024-01-01 10:00:00', '2024-01-01')",
            table,
            adapter.quote_column_name("small"),
            adapter.quote_column_name("ratio"),
            adapter.quote_column_name("price"),
            adapter.quote_column_name("taken_at"),
            adapter.quote_column_name("taken_on"),
        ))
        .await
        .unwrap();

    let rows = adapter
        .fetch_all(&format!("SELECT * FROM {}", table))
        .await
        .unwrap();
    let row = &rows[0];
    assert!(row.get_i64("id").is_some());
    assert_eq!(row.get_i64("small"), Some(-7));
    assert_eq!(row.get_str("ratio").as_deref(), Some("0.5"));
    assert_eq!(row.get_str("price").as_deref(), Some("12.50"));
    assert_eq!(row.get_str("taken_at").as_deref(), Some("2024-01-01 10:00:00"));
    assert_eq!(row.get_str("taken_on").as_deref(), Some("2024-01-01"));

    adapter
        .execute(&format!("DROP TABLE {}", table))
        .await
        .unwrap();
}

async fn exercise(adapter: &Adapter) {
    reset(adapter).await;
    adapter.create_table(customers()).await.unwrap();
    adapter.create_table(orders()).await.unwrap();

    assert!(adapter.has_table("live_orders").await.unwrap());
    assert!(adapter.has_index("live_customers", &["email"]).await.unwrap());
    assert!(adapter
        .has_foreign_key("live_orders", &["customer_id"], None)
        .await
        .unwrap());
    assert!(adapter
        .has_foreign_key("live_orders", &[], Some("live_orders_customer"))
        .await
        .unwrap());

    let columns = adapter.get_columns("live_customers").await.unwrap();
    assert!(columns[0].identity);
    assert_eq!(columns[1].column_type, ColumnType::String);
    assert_eq!(columns[1].limit, Some(120));
    assert_eq!(columns[2].column_type, ColumnType::Boolean);

    adapter
        .change_column(
            "live_customers",
            "email",
            &Column::new("email", ColumnType::String)
                .limit(200)
                .null(true)
                .default_value("nobody@example.com"),
        )
        .await
        .unwrap();
    let email = &adapter.get_columns("live_customers").await.unwrap()[1];
    assert!(email.null);
    assert_eq!(email.limit, Some(200));
    assert_eq!(
        email.default,
        Some(DefaultValue::Literal("nobody@example.com".to_string()))
    );

    adapter
        .rename_column("live_customers", "email", "contact")
        .await
        .unwrap();
    assert!(adapter.has_column("live_customers", "contact").await.unwrap());

    adapter
        .drop_foreign_key("live_orders", &["customer_id"], None)
        .await
        .unwrap();
    assert!(adapter.get_foreign_keys("live_orders").await.unwrap().is_empty());

    let stamp = parse_timestamp("2024-01-01 00:00:00").unwrap();
    adapter
        .migrated(&LiveMigration, Direction::Up, stamp, stamp)
        .await
        .unwrap();
    assert!(adapter.get_versions().await.unwrap().contains(&19700101000001));
    adapter
        .migrated(&LiveMigration, Direction::Down, stamp, stamp)
        .await
        .unwrap();
    assert!(!adapter.get_versions().await.unwrap().contains(&19700101000001));

    reset(adapter).await;
}

#[tokio::test]
#[ignore]
async fn test_postgres_round_trip() {
    let Some(mut adapter) = connect("DATABASE_URL").await else {
        return;
    };
    exercise(&adapter).await;
    read_typed_cells(&adapter).await;
    adapter.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_mysql_round_trip() {
    let Some(mut adapter) = connect("MYSQL_URL").await else {
        return;
    };
    exercise(&adapter).await;
    read_typed_cells(&adapter).await;
    adapter.disconnect().await.unwrap();
}
