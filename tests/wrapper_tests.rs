use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dbshift::models::migration::parse_timestamp;
use dbshift::{
    Adapter, AdapterWrapper, Column, ColumnType, Command, ConnectionConfig, DbError, DbSession,
    Dialect, Direction, DryRunInterceptor, Index, Migration, Operation, Passthrough, Row,
    SchemaAdapter, Table, TimingInterceptor,
};
use mockall::{mock, predicate};
use serde_json::json;

mock! {
    pub Session {}

    #[async_trait]
    impl DbSession for Session {
        async fn execute(&self, query: &str) -> Result<u64, DbError>;
        async fn query(&self, query: &str) -> Result<Vec<Row>, DbError>;
        async fn close(self: Box<Self>) -> Result<(), DbError>;
    }
}

type Statements = Arc<Mutex<Vec<String>>>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

async fn recording_adapter(statements: &Statements) -> Adapter {
    init_logger();
    let mut session = MockSession::new();
    session
        .expect_query()
        .with(predicate::eq("SHOW TABLES IN `app`"))
        .returning(|_| Ok(vec![Row::from_pairs([("Tables_in_app", json!("schema_versions"))])]));
    let log = Arc::clone(statements);
    session.expect_execute().returning(move |sql| {
        log.lock().unwrap().push(sql.to_string());
        Ok(1)
    });

    let mut adapter = Adapter::new(ConnectionConfig::new(Dialect::MySql, "app"));
    adapter.attach(Box::new(session)).await.unwrap();
    adapter
}

struct AddTags;

impl Migration for AddTags {
    fn version(&self) -> i64 {
        20240405080000
    }

    fn name(&self) -> &str {
        "AddTags"
    }
}

async fn apply(adapter: &dyn SchemaAdapter) -> Result<(), DbError> {
    let stamp = parse_timestamp("2024-04-05 08:00:00").unwrap_or_default();
    adapter
        .create_table(
            Table::new("tags")
                .column(Column::new("label", ColumnType::String).limit(40))
                .index(Index::new(["label"]).unique(true)),
        )
        .await?;
    adapter
        .add_column("tags", &Column::new("color", ColumnType::Char).limit(7).null(true))
        .await?;
    adapter.rename_table("tags", "labels").await?;
    adapter
        .migrated(&AddTags, Direction::Up, stamp, stamp)
        .await?;
    adapter.toggle_breakpoint(20240405080000).await?;
    Ok(())
}

#[tokio::test]
async fn test_passthrough_chain_issues_the_same_statements() {
    let bare_statements = Statements::default();
    let bare = recording_adapter(&bare_statements).await;
    apply(&bare).await.unwrap();

    let chained_statements = Statements::default();
    let mut chained: Box<dyn SchemaAdapter> =
        Box::new(recording_adapter(&chained_statements).await);
    for _ in 0..3 {
        chained = Box::new(AdapterWrapper::new(chained, Passthrough));
    }
    apply(chained.as_ref()).await.unwrap();

    let bare_statements = bare_statements.lock().unwrap().clone();
    assert_eq!(bare_statements.len(), 5);
    assert_eq!(*chained_statements.lock().unwrap(), bare_statements);
    assert_eq!(chained.dialect(), Dialect::MySql);
    assert!(chained.is_connected());
}

#[tokio::test]
async fn test_dry_run_executes_nothing() {
    let statements = Statements::default();
    let adapter = recording_adapter(&statements).await;
    let wrapper = AdapterWrapper::new(Box::new(adapter), DryRunInterceptor::new());

    apply(&wrapper).await.unwrap();
    assert_eq!(wrapper.reset_all_breakpoints().await.unwrap(), 0);

    assert!(statements.lock().unwrap().is_empty());
    let operations: Vec<Operation> = wrapper
        .interceptor()
        .skipped()
        .iter()
        .map(|command| command.operation)
        .collect();
    assert_eq!(
        operations,
        vec![
            Operation::CreateTable,
            Operation::AddColumn,
            Operation::RenameTable,
            Operation::Migrated,
            Operation::ToggleBreakpoint,
            Operation::ResetAllBreakpoints,
        ]
    );
    assert_eq!(
        wrapper.interceptor().skipped()[3],
        Command::migrated(20240405080000, "up")
    );
}

#[tokio::test]
async fn test_dry_run_skips_raw_statements() {
    let statements = Statements::default();
    let wrapper = AdapterWrapper::new(
        Box::new(recording_adapter(&statements).await),
        DryRunInterceptor::new(),
    );

    assert_eq!(wrapper.execute("DROP TABLE `users`").await.unwrap(), 0);
    wrapper.create_schema_table().await.unwrap();

    assert!(statements.lock().unwrap().is_empty());
    assert_eq!(
        wrapper.interceptor().skipped(),
        vec![
            Command::execute("DROP TABLE `users`"),
            Command::create_schema_table("schema_versions"),
        ]
    );
}

#[tokio::test]
async fn test_dry_run_still_reads() {
    let statements = Statements::default();
    let wrapper = AdapterWrapper::new(
        Box::new(recording_adapter(&statements).await),
        DryRunInterceptor::new(),
    );

    assert!(wrapper.has_table("schema_versions").await.unwrap());
    assert!(!wrapper.has_table("tags").await.unwrap());
    wrapper.begin_transaction().await.unwrap();
    assert_eq!(*statements.lock().unwrap(), vec!["START TRANSACTION"]);
}

#[tokio::test]
async fn test_timing_records_forwarded_commands() {
    let statements = Statements::default();
    let timed = AdapterWrapper::new(
        Box::new(recording_adapter(&statements).await),
        TimingInterceptor::new(),
    );

    apply(&timed).await.unwrap();

    let timings = timed.interceptor().timings();
    let rendered: Vec<String> = timings.iter().map(|(command, _)| command.to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            "create_table(tags)",
            "add_column(tags, color)",
            "rename_table(tags, labels)",
            "migrated(20240405080000, up)",
            "toggle_breakpoint(20240405080000)",
        ]
    );
    assert_eq!(statements.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn test_timing_records_failed_commands() {
    init_logger();
    let mut session = MockSession::new();
    session
        .expect_query()
        .returning(|_| Ok(vec![Row::from_pairs([("Tables_in_app", json!("schema_versions"))])]));
    session
        .expect_execute()
        .returning(|_| Err(DbError::Sqlx(sqlx::Error::Protocol("lock wait timeout".to_string()))));
    let mut adapter = Adapter::new(ConnectionConfig::new(Dialect::MySql, "app"));
    adapter.attach(Box::new(session)).await.unwrap();

    let timed = AdapterWrapper::new(Box::new(adapter), TimingInterceptor::new());
    assert!(timed.drop_table("tags").await.is_err());
    assert_eq!(timed.interceptor().timings()[0].0, Command::drop_table("tags"));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_wrapped_sqlite_adapter_end_to_end() {
    init_logger();
    let mut adapter = Adapter::new(ConnectionConfig::sqlite_memory());
    adapter.connect().await.unwrap();

    let mut timed = AdapterWrapper::new(Box::new(adapter), TimingInterceptor::new());
    apply(&timed).await.unwrap();
    assert!(timed.has_table("labels").await.unwrap());
    assert!(timed.has_index("labels", &["label"]).await.unwrap());
    assert_eq!(timed.get_versions().await.unwrap(), vec![20240405080000]);
    assert!(timed.get_version_log().await.unwrap()[0].breakpoint);

    let dry = AdapterWrapper::new(timed.into_inner(), DryRunInterceptor::new());
    dry.drop_table("labels").await.unwrap();
    assert_eq!(dry.execute("DROP TABLE \"labels\"").await.unwrap(), 0);
    assert!(dry.has_table("labels").await.unwrap());
    assert_eq!(dry.interceptor().skipped()[1].operation, Operation::Execute);

    timed = AdapterWrapper::new(dry.into_inner(), TimingInterceptor::new());
    timed.disconnect().await.unwrap();
    assert!(!timed.is_connected());
}
