//! Integration tests for model finders and mutators on SQLite.

use tablemap::config::{PoolConfig, RowCountPolicy};
use tablemap::db::{ConnectionPool, QueryExecutor};
use tablemap::models::{FindOptions, Limit, Value};
use tablemap::orm::{Model, ModelOps, Record};
use tablemap::schema::{Field, ModelDecl};
use tablemap::DbError;
use tempfile::TempDir;

struct Account {
    record: Record,
}

impl Model for Account {
    fn declare() -> ModelDecl {
        ModelDecl::new("Account")
            .table("accounts")
            .field("id", Field::integer().primary_key())
            .field("name", Field::string())
            .field("balance", Field::float())
    }

    fn from_record(record: Record) -> Self {
        Self { record }
    }

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

struct Profile {
    record: Record,
}

impl Model for Profile {
    fn declare() -> ModelDecl {
        ModelDecl::new("Profile")
            .table("profiles")
            .field("id", Field::string().name("profile_id").primary_key())
            .field("email", Field::string().name("email_address").ddl("varchar(50)"))
            .field("admin", Field::boolean().default_value(false))
            .field("bio", Field::text())
            .field(
                "created_at",
                Field::string().default_with(|| Value::from("2024-01-01 00:00:00")),
            )
    }

    fn from_record(record: Record) -> Self {
        Self { record }
    }

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

/// Helper to setup a SQLite pool with the accounts and profiles tables
async fn setup_executor(dir: &TempDir) -> QueryExecutor {
    let path = dir.path().join("models.db");
    let pool = ConnectionPool::connect(PoolConfig::sqlite(path.to_string_lossy()).with_size(1, 4))
        .await
        .expect("Failed to open SQLite pool");
    let executor = QueryExecutor::new(pool);

    for schema in [Account::schema().unwrap(), Profile::schema().unwrap()] {
        executor
            .execute(&schema.create_table_sql(), &[])
            .await
            .expect("Failed to create test table");
    }
    executor
}

async fn insert_accounts(executor: &QueryExecutor, count: i64) {
    for id in 1..=count {
        let mut account = Account::create([
            ("id", Value::Int(id)),
            ("name", Value::from(format!("user{id}"))),
            ("balance", Value::Float(id as f64 * 10.0)),
        ])
        .unwrap();
        assert_eq!(account.save(executor).await.unwrap(), 1);
    }
}

fn ids(accounts: &[Account]) -> Vec<i64> {
    accounts
        .iter()
        .map(|a| a.value("id").as_i64().unwrap())
        .collect()
}

// =========================================================================
// save / find
// =========================================================================

#[tokio::test]
async fn test_save_then_find_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let executor = setup_executor(&dir).await;

    let mut account = Account::create([("id", Value::Int(1)), ("name", Value::from("a"))]).unwrap();
    account.save(&executor).await.unwrap();

    // The resolved default is cached on the instance
    assert_eq!(account.get("balance"), Some(&Value::Float(0.0)));

    let found = Account::find(&executor, 1).await.unwrap().expect("row exists");
    let expected: Record = [
        ("id", Value::Int(1)),
        ("name", Value::from("a")),
        ("balance", Value::Float(0.0)),
    ]
    .into_iter()
    .collect();
    assert_eq!(found.record(), &expected);
}

#[tokio::test]
async fn test_find_missing_returns_none() {
    let dir = TempDir::new().unwrap();
    let executor = setup_executor(&dir).await;

    assert!(Account::find(&executor, 42).await.unwrap().is_none());
}

#[tokio::test]
async fn test_column_overrides_and_typed_values_round_trip() {
    let dir = TempDir::new().unwrap();
    let executor = setup_executor(&dir).await;

    let mut profile = Profile::create([
        ("id", Value::from("p1")),
        ("email", Value::from("ada@example.com")),
        ("bio", Value::from("数学家 and writer")),
    ])
    .unwrap();
    profile.save(&executor).await.unwrap();

    let found = Profile::find(&executor, "p1").await.unwrap().unwrap();
    assert_eq!(found.value("email"), Value::from("ada@example.com"));
    assert_eq!(found.value("admin"), Value::Bool(false));
    assert_eq!(found.value("bio"), Value::from("数学家 and writer"));
    assert_eq!(found.value("created_at"), Value::from("2024-01-01 00:00:00"));
    assert!(found.get("profile_id").is_none());
}

#[tokio::test]
async fn test_create_rejects_unknown_attribute() {
    let err = Account::create([("id", Value::Int(1)), ("nickname", Value::from("x"))])
        .err()
        .expect("unknown attribute must be rejected");
    assert!(matches!(err, DbError::InvalidInput { .. }));
    assert!(err.to_string().contains("nickname"));
}

// =========================================================================
// update / remove
// =========================================================================

#[tokio::test]
async fn test_update_then_find() {
    let dir = TempDir::new().unwrap();
    let executor = setup_executor(&dir).await;
    insert_accounts(&executor, 1).await;

    let mut account = Account::find(&executor, 1).await.unwrap().unwrap();
    account.set("name", "renamed");
    account.set("balance", 99.5);
    assert_eq!(account.update(&executor).await.unwrap(), 1);

    let found = Account::find(&executor, 1).await.unwrap().unwrap();
    assert_eq!(found.value("id"), Value::Int(1));
    assert_eq!(found.value("name"), Value::from("renamed"));
    assert_eq!(found.value("balance"), Value::Float(99.5));
}

#[tokio::test]
async fn test_update_writes_null_for_unset_values() {
    let dir = TempDir::new().unwrap();
    let executor = setup_executor(&dir).await;
    insert_accounts(&executor, 1).await;

    let account = Account::create([("id", Value::Int(1))]).unwrap();
    account.update(&executor).await.unwrap();

    let found = Account::find(&executor, 1).await.unwrap().unwrap();
    assert_eq!(found.value("name"), Value::Null);
    assert_eq!(found.value("balance"), Value::Null);
}

#[tokio::test]
async fn test_remove_then_find() {
    let dir = TempDir::new().unwrap();
    let executor = setup_executor(&dir).await;
    insert_accounts(&executor, 2).await;

    let account = Account::find(&executor, 2).await.unwrap().unwrap();
    assert_eq!(account.remove(&executor).await.unwrap(), 1);
    assert!(Account::find(&executor, 2).await.unwrap().is_none());
    assert!(Account::find(&executor, 1).await.unwrap().is_some());
}

#[tokio::test]
async fn test_row_count_policy() {
    let dir = TempDir::new().unwrap();
    let executor = setup_executor(&dir).await;

    let ghost = Account::create([("id", Value::Int(7))]).unwrap();

    // Warn: the count is reported, not an error
    assert_eq!(ghost.remove(&executor).await.unwrap(), 0);

    let strict = executor.with_row_count_policy(RowCountPolicy::Error);
    let err = ghost.remove(&strict).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::RowCount {
            expected: 1,
            actual: 0,
            ..
        }
    ));
}

#[tokio::test]
async fn test_duplicate_save_returns_driver_error() {
    let dir = TempDir::new().unwrap();
    let executor = setup_executor(&dir).await;
    insert_accounts(&executor, 1).await;

    let mut again = Account::create([("id", Value::Int(1)), ("name", Value::from("dup"))]).unwrap();
    let err = again.save(&executor).await.unwrap_err();
    assert!(err.as_driver().is_some(), "expected driver error, got {err}");
}

// =========================================================================
// find_all / find_number
// =========================================================================

#[tokio::test]
async fn test_find_all_with_clauses() {
    let dir = TempDir::new().unwrap();
    let executor = setup_executor(&dir).await;
    insert_accounts(&executor, 5).await;

    let all = Account::find_all(&executor, FindOptions::new().order_by("`id`"))
        .await
        .unwrap();
    assert_eq!(ids(&all), [1, 2, 3, 4, 5]);

    let rich = Account::find_all(
        &executor,
        FindOptions::new()
            .filter("`balance` >= ?", [30.0])
            .order_by("`id` desc"),
    )
    .await
    .unwrap();
    assert_eq!(ids(&rich), [5, 4, 3]);

    let first_two = Account::find_all(&executor, FindOptions::new().order_by("`id`").limit(2))
        .await
        .unwrap();
    assert_eq!(ids(&first_two), [1, 2]);

    let window = Account::find_all(
        &executor,
        FindOptions::new().order_by("`id`").limit((1, 2)),
    )
    .await
    .unwrap();
    assert_eq!(ids(&window), [2, 3]);

    let past_end = Account::find_all(
        &executor,
        FindOptions::new().order_by("`id`").limit((4, 10)),
    )
    .await
    .unwrap();
    assert_eq!(ids(&past_end), [5]);
}

#[tokio::test]
async fn test_find_all_invalid_limit_never_touches_database() {
    let dir = TempDir::new().unwrap();
    let executor = setup_executor(&dir).await;

    // A closed pool fails every statement, so only argument checking can answer
    executor.pool().close().await;

    let err = Account::find_all(&executor, FindOptions::new().limit(-1))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, DbError::InvalidInput { .. }));

    let err = Account::find_all(&executor, FindOptions::new().limit((2, -1)))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, DbError::InvalidInput { .. }));

    let bad_shape: &[i64] = &[1, 2, 3];
    assert!(matches!(
        Limit::try_from(bad_shape),
        Err(DbError::InvalidInput { .. })
    ));

    // A valid request does reach the (closed) pool
    let err = Account::find_all(&executor, FindOptions::new().limit(1))
        .await
        .err()
        .unwrap();
    assert!(err.as_driver().is_some());
}

#[tokio::test]
async fn test_find_number() {
    let dir = TempDir::new().unwrap();
    let executor = setup_executor(&dir).await;
    insert_accounts(&executor, 4).await;

    let count = Account::find_number(&executor, "count(`id`)", None, &[])
        .await
        .unwrap();
    assert_eq!(count, Some(Value::Int(4)));

    let count = Account::find_number(
        &executor,
        "count(`id`)",
        Some("`balance` > ?"),
        &[Value::Float(15.0)],
    )
    .await
    .unwrap();
    assert_eq!(count, Some(Value::Int(3)));

    let max = Account::find_number(&executor, "max(`balance`)", None, &[])
        .await
        .unwrap();
    assert_eq!(max, Some(Value::Float(40.0)));

    let none = Account::find_number(&executor, "`id`", Some("`id` > ?"), &[Value::Int(100)])
        .await
        .unwrap();
    assert_eq!(none, None);
}

#[tokio::test]
async fn test_find_number_null_aggregate_is_none() {
    let dir = TempDir::new().unwrap();
    let executor = setup_executor(&dir).await;

    let max = Account::find_number(&executor, "max(`balance`)", None, &[])
        .await
        .unwrap();
    assert_eq!(max, None);

    let count = Account::find_number(&executor, "count(`id`)", None, &[])
        .await
        .unwrap();
    assert_eq!(count, Some(Value::Int(0)));
}
