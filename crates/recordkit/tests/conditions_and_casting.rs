use chrono::NaiveDate;
use recordkit::prelude::*;
use recordkit::{ColumnCaster, ConditionArg, SemanticType, SqlBuilder, count_placeholders};

#[test]
fn equality_placeholders_match_binds() {
    let condition = Condition::equality([
        ("name", Value::from("Tom")),
        ("id", Value::from(vec![1_i64, 2, 3])),
        ("deleted_at", Value::Null),
    ]);
    let compiled = condition.compile(Dialect::Mysql).unwrap();
    assert_eq!(
        compiled.sql,
        "`name` = ? AND `id` IN (?, ?, ?) AND `deleted_at` IS NULL"
    );
    assert_eq!(count_placeholders(&compiled.sql), compiled.values.len());
    assert_eq!(compiled.values.len(), 4);
}

#[test]
fn empty_list_never_matches() {
    let compiled = Condition::equality([("id", Value::Array(Vec::new()))])
        .compile(Dialect::Postgres)
        .unwrap();
    assert_eq!(compiled.sql, "1 = 0");
    assert!(compiled.values.is_empty());

    let positional = Condition::positional("id NOT IN (?)", vec![Value::Array(Vec::new())])
        .compile(Dialect::Postgres)
        .unwrap();
    assert_eq!(positional.sql, "id NOT IN (NULL)");
    assert!(positional.values.is_empty());
}

#[test]
fn quoted_question_marks_are_not_placeholders() {
    let compiled = Condition::positional("note = 'why?' AND id = ?", vec![Value::BigInt(1)])
        .compile(Dialect::Sqlite)
        .unwrap();
    assert_eq!(compiled.values, vec![Value::BigInt(1)]);
    assert_eq!(count_placeholders(&compiled.sql), 1);
}

#[test]
fn loose_argument_forms() {
    let from_sql = Condition::from_args(vec![
        ConditionArg::Sql("status = ? OR total > ?".into()),
        ConditionArg::Value(Value::from("open")),
        ConditionArg::Value(Value::BigInt(10)),
    ])
    .unwrap();
    assert_eq!(from_sql.compile(Dialect::Postgres).unwrap().values.len(), 2);

    assert!(Condition::from_finder("name_and_age_or_city", Vec::new()).is_err());
}

#[test]
fn update_binds_assignments_before_conditions() {
    let (sql, binds) = SqlBuilder::update(Dialect::Postgres, "orders")
        .value("status", Value::from("void"))
        .filter_condition(&Condition::equality([("id", 9_i64)]))
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(sql, "UPDATE \"orders\" SET \"status\" = ? WHERE (\"id\" = ?)");
    assert_eq!(binds, vec![Value::from("void"), Value::BigInt(9)]);
}

#[test]
fn options_from_loose_pairs() {
    let options = FindOptions::from_pairs([
        ("limit", 10_i64.into()),
        ("order", "created_at DESC".into()),
        ("readonly", true.into()),
    ])
    .unwrap();
    assert_eq!(options.limit, Some(10));
    assert!(options.readonly);

    let err = FindOptions::from_pairs([("colour", "red".into())]).unwrap_err();
    assert!(matches!(err, Error::Builder(_)));
}

#[test]
fn casting_a_raw_value_twice_is_stable() {
    let cases = [
        (SemanticType::Integer, Value::from("42")),
        (SemanticType::Boolean, Value::from("t")),
        (SemanticType::Decimal, Value::from("10.25")),
        (SemanticType::Date, Value::from("2024-02-29")),
        (SemanticType::Datetime, Value::from("2024-02-29 08:30:00")),
        (SemanticType::Time, Value::from("08:30:00")),
        (SemanticType::String, Value::from("plain")),
        (SemanticType::Binary, Value::Bytes(vec![0, 159, 255])),
    ];
    for (semantic_type, raw) in cases {
        let caster = ColumnCaster::new(semantic_type, Dialect::Postgres);
        let once = caster.cast_from_raw(&raw).unwrap();
        let twice = caster.cast_for_write(once.clone()).unwrap();
        assert_eq!(once, twice, "{semantic_type:?}");
    }

    let date = ColumnCaster::new(SemanticType::Date, Dialect::Postgres)
        .cast_from_raw(&Value::from("2024-02-29"))
        .unwrap();
    assert_eq!(
        date,
        Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
    );
}

#[test]
fn cast_errors_name_the_target_type() {
    let err = ColumnCaster::new(SemanticType::Integer, Dialect::Postgres)
        .cast_for_write(Value::from("twelve"))
        .unwrap_err();
    match err {
        Error::Cast(cast) => assert_eq!(cast.target, "integer"),
        other => panic!("expected cast error, got {other}"),
    }
}
