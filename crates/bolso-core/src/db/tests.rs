//! Database tests

use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn record(db: &Database, user_id: i64, category: &str, amount: f64, day: NaiveDate) -> Expense {
    let category = db.upsert_category(category).unwrap();
    db.insert_expense(&NewExpense {
        user_id,
        description: format!("{} {}", category.name, amount),
        category_id: Some(category.id),
        amount,
        date: day,
    })
    .unwrap()
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    assert!(db.all_categories().unwrap().is_empty());
    assert!(db.path().contains("bolso_test_"));
}

#[test]
fn test_derive_key_is_stable() {
    let a = derive_key("senha").unwrap();
    let b = derive_key("senha").unwrap();
    assert_eq!(a, b);
    assert_ne!(a, derive_key("outra").unwrap());
}

#[test]
fn test_schema_exists() {
    let db = Database::in_memory().unwrap();
    let conn = db.conn().unwrap();
    let result: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('expenses') WHERE name IN ('id', 'user_id', 'description', 'category_id', 'amount', 'date')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(result, 6);
}

#[test]
fn test_user_upsert_is_idempotent() {
    let db = Database::in_memory().unwrap();
    let first = db.upsert_user("whatsapp:+5511999998888").unwrap();
    let second = db.upsert_user("whatsapp:+5511999998888").unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.phone, "whatsapp:+5511999998");
    assert!(first.name.is_none());

    let found = db.get_user_by_phone("whatsapp:+5511999998888").unwrap();
    assert_eq!(found.map(|u| u.id), Some(first.id));
    assert!(db.get_user_by_phone("+5500000000").unwrap().is_none());
    assert!(db.upsert_user("   ").is_err());
}

#[test]
fn test_set_user_name() {
    let db = Database::in_memory().unwrap();
    let user = db.upsert_user("+5511988887777").unwrap();
    db.set_user_name(user.id, Some("Ana")).unwrap();
    let user = db.upsert_user("+5511988887777").unwrap();
    assert_eq!(user.name.as_deref(), Some("Ana"));
    assert!(matches!(db.set_user_name(999, None), Err(Error::NotFound(_))));
}

#[test]
fn test_user_lookup_surfaces_sqlite_errors() {
    let db = Database::in_memory().unwrap();
    db.upsert_user("+5511988887777").unwrap();
    db.conn()
        .unwrap()
        .execute_batch("DROP TABLE expenses; DROP TABLE users;")
        .unwrap();

    // a broken table is an error, not a missing user
    assert!(matches!(
        db.get_user_by_phone("+5511988887777"),
        Err(Error::Database(_))
    ));
}

#[test]
fn test_seed_categories() {
    let db = Database::in_memory().unwrap();
    assert_eq!(db.seed_categories().unwrap(), 6);
    assert_eq!(db.seed_categories().unwrap(), 0);

    let names: Vec<String> = db.all_categories().unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(
        names,
        vec!["Alimentação", "Transporte", "Moradia", "Lazer", "Saúde", "Outros"]
    );
}

#[test]
fn test_category_lookup_ignores_case() {
    let db = Database::in_memory().unwrap();
    db.seed_categories().unwrap();
    let saude = db.get_category_by_name("SAÚDE").unwrap().unwrap();
    assert_eq!(saude.name, "Saúde");
    assert!(db.get_category_by_name("Viagem").unwrap().is_none());
    assert!(db.get_category_by_name("").unwrap().is_none());

    let created = db.upsert_category("Viagem").unwrap();
    assert_eq!(db.upsert_category("viagem").unwrap().id, created.id);
}

#[test]
fn test_list_expenses_bounds_and_order() {
    let db = Database::in_memory().unwrap();
    let user = db.upsert_user("+5511911112222").unwrap();
    let other = db.upsert_user("+5511933334444").unwrap();

    record(&db, user.id, "Alimentação", 50.0, date(2024, 5, 1));
    record(&db, user.id, "Transporte", 20.0, date(2024, 5, 10));
    record(&db, user.id, "Lazer", 80.0, date(2024, 5, 20));
    record(&db, other.id, "Lazer", 999.0, date(2024, 5, 10));

    let all = db.list_user_expenses(user.id, None, None).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].date, date(2024, 5, 20));
    assert_eq!(all[2].date, date(2024, 5, 1));
    assert_eq!(all[1].category_name, "Transporte");

    // bounds are inclusive
    let window = db
        .list_user_expenses(user.id, Some(date(2024, 5, 10)), Some(date(2024, 5, 20)))
        .unwrap();
    assert_eq!(window.len(), 2);

    let from = db
        .list_user_expenses(user.id, Some(date(2024, 5, 11)), None)
        .unwrap();
    assert_eq!(from.len(), 1);
}

#[test]
fn test_expense_without_category_reads_as_default() {
    let db = Database::in_memory().unwrap();
    let user = db.upsert_user("+5511955556666").unwrap();
    let expense = db
        .insert_expense(&NewExpense {
            user_id: user.id,
            description: "Despesa".into(),
            category_id: None,
            amount: 10.0,
            date: date(2024, 5, 20),
        })
        .unwrap();
    assert_eq!(expense.category_name, "Outros");

    let listed = db.list_user_expenses(user.id, None, None).unwrap();
    assert_eq!(listed[0].category_name, "Outros");
    assert_eq!(listed[0].category_id, None);
}

#[test]
fn test_negative_amount_rejected() {
    let db = Database::in_memory().unwrap();
    let user = db.upsert_user("+5511977778888").unwrap();
    let result = db.insert_expense(&NewExpense {
        user_id: user.id,
        description: "estorno".into(),
        category_id: None,
        amount: -5.0,
        date: date(2024, 5, 20),
    });
    assert!(matches!(result, Err(Error::InvalidData(_))));
}

#[tokio::test]
async fn test_record_store_impl() {
    let db = Database::in_memory().unwrap();
    db.seed_categories().unwrap();
    let store: &dyn RecordStore = &db;

    let user = store.find_or_create_user("+5511900001111").await.unwrap();
    assert_eq!(
        store.find_user_by_phone("+5511900001111").await.unwrap().map(|u| u.id),
        Some(user.id)
    );

    let category = store.find_or_create_category("alimentação").await.unwrap();
    assert_eq!(category.name, "Alimentação");
    assert_eq!(store.list_categories().await.unwrap().len(), 6);

    let expense = store
        .create_expense(&NewExpense {
            user_id: user.id,
            description: "mercado".into(),
            category_id: Some(category.id),
            amount: 50.0,
            date: date(2024, 5, 20),
        })
        .await
        .unwrap();
    assert_eq!(expense.category_name, "Alimentação");

    let listed = store.list_expenses(user.id, None, None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, expense.id);
}
