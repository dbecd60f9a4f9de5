use mysql_async::Value as MySqlValue;
use scratchdb_core::{Row, Value};

pub(crate) fn row_from_mysql(row: &mysql_async::Row) -> Row {
    let columns = row
        .columns_ref()
        .iter()
        .map(|column| column.name_str().into_owned())
        .collect();

    let values = (0..row.len())
        .map(|index| row.as_ref(index).map(value_from_mysql).unwrap_or(Value::Null))
        .collect();

    Row::new(columns, values)
}

fn value_from_mysql(value: &MySqlValue) -> Value {
    match value {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Int(v) => Value::I64(*v),
        MySqlValue::UInt(v) => Value::U64(*v),
        MySqlValue::Float(v) => Value::F64(f64::from(*v)),
        MySqlValue::Double(v) => Value::F64(*v),
        MySqlValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Value::String(text.to_string()),
            Err(_) => Value::Bytes(bytes.clone()),
        },
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => Value::String(format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"
        )),
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let hours = u32::from(*hours) + days * 24;
            Value::String(format!(
                "{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
            ))
        }
    }
}
