use scratchdb_core::{Error, Result, Row, Value};
use tokio_postgres::{types::FromSql, types::Type, Column};

/// Converts a PostgreSQL row into a [`Row`].
pub(crate) fn row_from_postgres(row: &tokio_postgres::Row) -> Result<Row> {
    let columns = row
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();

    let values = row
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| value_from_postgres(row, index, column))
        .collect::<Result<Vec<_>>>()?;

    Ok(Row::new(columns, values))
}

fn value_from_postgres(row: &tokio_postgres::Row, index: usize, column: &Column) -> Result<Value> {
    // The type enum's representation is private, so each type is matched by
    // comparison.
    let ty = column.type_();

    if *ty == Type::BOOL {
        get::<bool>(row, index).map(Value::from)
    } else if *ty == Type::INT2 {
        get::<i16>(row, index).map(|v| Value::from(v.map(i64::from)))
    } else if *ty == Type::INT4 {
        get::<i32>(row, index).map(|v| Value::from(v.map(i64::from)))
    } else if *ty == Type::INT8 {
        get::<i64>(row, index).map(Value::from)
    } else if *ty == Type::OID {
        get::<u32>(row, index).map(|v| Value::from(v.map(u64::from)))
    } else if *ty == Type::FLOAT4 {
        get::<f32>(row, index).map(|v| Value::from(v.map(f64::from)))
    } else if *ty == Type::FLOAT8 {
        get::<f64>(row, index).map(Value::from)
    } else if *ty == Type::TEXT
        || *ty == Type::VARCHAR
        || *ty == Type::BPCHAR
        || *ty == Type::NAME
    {
        get::<String>(row, index).map(Value::from)
    } else if *ty == Type::BYTEA {
        get::<Vec<u8>>(row, index).map(Value::from)
    } else {
        Err(Error::unsupported_feature(format!(
            "reading PostgreSQL type `{ty}` (column `{}`)",
            column.name()
        )))
    }
}

fn get<'a, T: FromSql<'a>>(row: &'a tokio_postgres::Row, index: usize) -> Result<Option<T>> {
    row.try_get::<usize, Option<T>>(index)
        .map_err(Error::driver_operation_failed)
}
