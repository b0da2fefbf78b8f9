mod fixtures;

use fixtures::{
    MockConnection, Order, expect_err, order_row, orders_connection, run, session, unwrap_outcome,
};
use recordkit::prelude::*;
use recordkit::{ROW_NUMBER_COLUMN, count_placeholders};

#[test]
fn find_with_equality_conditions() {
    let conn = orders_connection();
    let session = session(&conn);
    conn.push_rows(vec![order_row(1, "open"), order_row(2, "open")]);

    run(async {
        let cx = Cx::for_testing();
        let options = FindOptions::new()
            .conditions(Condition::equality([("status", "open")]))
            .order("id");
        let records = unwrap_outcome(session.find::<Order>(&cx, options).await);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("status").unwrap(), Value::from("open"));
        assert_eq!(records[1].get("id").unwrap(), Value::BigInt(2));
        assert!(!records[0].is_dirty());
        assert!(!records[0].is_new_record());
    });

    let (sql, binds) = conn.last_statement();
    assert_eq!(
        sql,
        "SELECT * FROM \"orders\" WHERE (\"status\" = ?) ORDER BY id"
    );
    assert_eq!(binds, vec![Value::from("open")]);
}

#[test]
fn null_equality_renders_is_null_without_bind() {
    let conn = orders_connection();
    let session = session(&conn);

    run(async {
        let cx = Cx::for_testing();
        let options = FindOptions::new().conditions(Condition::equality([
            ("customer_id", Value::Null),
            ("status", Value::from("open")),
        ]));
        unwrap_outcome(session.find::<Order>(&cx, options).await);
    });

    let (sql, binds) = conn.last_statement();
    assert!(sql.contains("\"customer_id\" IS NULL AND \"status\" = ?"));
    assert_eq!(count_placeholders(&sql), binds.len());
    assert_eq!(binds, vec![Value::from("open")]);
}

#[test]
fn find_by_pk_hydrates_typed_attributes() {
    let conn = orders_connection();
    let session = session(&conn);
    conn.push_rows(vec![order_row(5, "shipped")]);

    run(async {
        let cx = Cx::for_testing();
        let order = unwrap_outcome(session.find_by_pk::<Order>(&cx, 5_i64).await);
        assert_eq!(order.get("id").unwrap(), Value::BigInt(5));
        assert_eq!(order.get("total").unwrap(), Value::Decimal("19.90".into()));
        assert_eq!(order.get("paid").unwrap(), Value::Bool(false));
    });

    let (sql, binds) = conn.last_statement();
    assert_eq!(sql, "SELECT * FROM \"orders\" WHERE (\"id\" = ?)");
    assert_eq!(binds, vec![Value::BigInt(5)]);
}

#[test]
fn find_by_pk_missing_row_is_not_found() {
    let conn = orders_connection();
    let session = session(&conn);

    let err = run(async {
        let cx = Cx::for_testing();
        expect_err(session.find_by_pk::<Order>(&cx, 5_i64).await)
    });

    match err {
        Error::NotFound(nf) => {
            assert_eq!(nf.model, "Order");
            assert_eq!(nf.keys, vec![Value::BigInt(5)]);
            assert_eq!(nf.expected, 1);
            assert_eq!(nf.found, 0);
        }
        other => panic!("expected NotFound, got {other}"),
    }
}

#[test]
fn find_all_by_pk_reports_partial_matches() {
    let conn = orders_connection();
    let session = session(&conn);
    conn.push_rows(vec![order_row(1, "open")]);

    let err = run(async {
        let cx = Cx::for_testing();
        expect_err(
            session
                .find_all_by_pk::<Order>(&cx, vec![Value::BigInt(1), Value::BigInt(2)])
                .await,
        )
    });

    assert!(matches!(err, Error::NotFound(ref nf) if nf.expected == 2 && nf.found == 1));
    let (sql, _) = conn.last_statement();
    assert!(sql.ends_with("WHERE (\"id\" IN (?, ?))"));
}

#[test]
fn find_by_pk_with_extra_conditions_binds_them_first() {
    let conn = orders_connection();
    let session = session(&conn);
    conn.push_rows(vec![order_row(3, "open")]);

    run(async {
        let cx = Cx::for_testing();
        let options = FindOptions::new().conditions(Condition::equality([("paid", false)]));
        unwrap_outcome(session.find_by_pk_with::<Order>(&cx, 3_i64, options).await);
    });

    let (sql, binds) = conn.last_statement();
    assert!(sql.ends_with("WHERE (\"paid\" = ?) AND (\"id\" = ?)"));
    assert_eq!(binds, vec![Value::Bool(false), Value::BigInt(3)]);
}

#[test]
fn empty_key_list_matches_nothing() {
    let conn = orders_connection();
    let session = session(&conn);

    run(async {
        let cx = Cx::for_testing();
        let records = unwrap_outcome(session.find_all_by_pk::<Order>(&cx, Vec::new()).await);
        assert!(records.is_empty());
    });

    let (sql, binds) = conn.last_statement();
    assert!(sql.ends_with("WHERE (1 = 0)"));
    assert!(binds.is_empty());
}

#[test]
fn dynamic_finders() {
    let conn = orders_connection();
    let session = session(&conn);
    conn.push_rows(vec![order_row(1, "open")]);

    run(async {
        let cx = Cx::for_testing();
        let found = unwrap_outcome(
            session
                .find_by::<Order>(
                    &cx,
                    "find_by_status_and_customer_id",
                    vec![Value::from("open"), Value::Int(7)],
                )
                .await,
        );
        assert!(found.is_some());

        let err = expect_err(
            session
                .find_all_by::<Order>(&cx, "colour", vec![Value::from("red")])
                .await,
        );
        assert!(matches!(err, Error::UnknownAttribute { .. }));
    });

    let (sql, binds) = conn.statements()[0].clone();
    assert_eq!(
        sql,
        "SELECT * FROM \"orders\" WHERE (\"status\" = ? AND \"customer_id\" = ?) LIMIT 1"
    );
    assert_eq!(binds.len(), 2);
}

#[test]
fn malformed_conditions_fail_before_any_statement() {
    let conn = orders_connection();
    let session = session(&conn);

    run(async {
        let cx = Cx::for_testing();
        let options = FindOptions::new().conditions(Condition::positional(
            "status = ? AND paid = ?",
            vec![Value::from("open")],
        ));
        let err = expect_err(session.find::<Order>(&cx, options).await);
        assert!(matches!(err, Error::Builder(_)));
    });

    assert!(conn.statements().is_empty());
}

#[test]
fn first_last_count_exists() {
    let conn = orders_connection();
    let session = session(&conn);
    conn.push_rows(vec![order_row(1, "open")]);
    conn.push_rows(vec![order_row(9, "open")]);
    conn.push_rows(vec![Row::from_pairs([("count", Value::from("42"))])]);
    conn.push_rows(Vec::new());

    run(async {
        let cx = Cx::for_testing();
        let first = unwrap_outcome(session.first::<Order>(&cx, FindOptions::new()).await);
        assert_eq!(first.unwrap().get("id").unwrap(), Value::BigInt(1));

        let last = unwrap_outcome(session.last::<Order>(&cx, FindOptions::new()).await);
        assert_eq!(last.unwrap().get("id").unwrap(), Value::BigInt(9));

        let count = unwrap_outcome(session.count::<Order>(&cx, FindOptions::new()).await);
        assert_eq!(count, 42);

        let exists = unwrap_outcome(
            session
                .exists::<Order>(
                    &cx,
                    FindOptions::new().conditions(Condition::equality([("status", "void")])),
                )
                .await,
        );
        assert!(!exists);
    });

    let sql: Vec<String> = conn.statements().into_iter().map(|(sql, _)| sql).collect();
    assert_eq!(sql[0], "SELECT * FROM \"orders\" LIMIT 1");
    assert_eq!(sql[1], "SELECT * FROM \"orders\" ORDER BY \"id\" DESC LIMIT 1");
    assert_eq!(sql[2], "SELECT COUNT(*) FROM \"orders\"");
    assert_eq!(
        sql[3],
        "SELECT 1 FROM \"orders\" WHERE (\"status\" = ?) LIMIT 1"
    );
}

#[test]
fn readonly_option_marks_records() {
    let conn = orders_connection();
    let session = session(&conn);
    conn.push_rows(vec![order_row(1, "open")]);

    run(async {
        let cx = Cx::for_testing();
        let records =
            unwrap_outcome(session.find::<Order>(&cx, FindOptions::new().readonly(true)).await);
        assert!(records[0].is_readonly());
    });
}

#[test]
fn find_by_sql_expands_in_lists() {
    let conn = orders_connection();
    let session = session(&conn);
    conn.push_rows(vec![order_row(1, "open"), order_row(2, "open")]);

    run(async {
        let cx = Cx::for_testing();
        let records = unwrap_outcome(
            session
                .find_by_sql::<Order>(
                    &cx,
                    "SELECT * FROM orders WHERE id IN (?)",
                    vec![Value::from(vec![1_i64, 2])],
                )
                .await,
        );
        assert_eq!(records.len(), 2);
    });

    let (sql, binds) = conn.last_statement();
    assert_eq!(sql, "SELECT * FROM orders WHERE id IN (?, ?)");
    assert_eq!(binds, vec![Value::BigInt(1), Value::BigInt(2)]);
}

struct Item;

impl Model for Item {
    const CLASS_NAME: &'static str = "Item";
    const TABLE_NAME: Option<&'static str> = Some("ITEMS");
}

#[test]
fn row_number_pagination_strips_pseudo_column() {
    let conn = MockConnection::new(Dialect::Oracle).with_table(
        "ITEMS",
        vec![
            RawColumn::new("ID", "NUMBER(10,0)").primary_key(),
            RawColumn::new("NAME", "VARCHAR2(40)"),
        ],
    );
    let session = session(&conn);
    conn.push_rows(
        (11..=15)
            .map(|n| {
                Row::from_pairs([
                    ("ID", Value::Int(n)),
                    ("NAME", Value::from(format!("item {n}"))),
                    ("RK_RNUM__", Value::Int(n)),
                ])
            })
            .collect(),
    );

    run(async {
        let cx = Cx::for_testing();
        let options = FindOptions::new().order("ID").limit(5).offset(10);
        let records = unwrap_outcome(session.find::<Item>(&cx, options).await);

        assert_eq!(records.len(), 5);
        for record in &records {
            assert!(record.read_attribute("RK_RNUM__").is_none());
            assert!(record.get("RK_RNUM__").is_err());
            assert!(record.get(ROW_NUMBER_COLUMN).is_err());
            assert_eq!(record.attributes().len(), 2);
        }
        assert_eq!(records[0].get("id").unwrap(), Value::BigInt(11));
    });

    let (sql, _) = conn.last_statement();
    assert!(sql.starts_with(
        "SELECT * FROM (SELECT t.*, ROWNUM rk_rnum__ FROM (SELECT * FROM \"ITEMS\" ORDER BY ID"
    ));
    assert!(sql.contains("WHERE ROWNUM <= 15"));
    assert!(sql.ends_with("WHERE rk_rnum__ > 10"));
}
