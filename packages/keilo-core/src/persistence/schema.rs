//! On-disk JSON representation of tables and the manifest.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::DbError;
use crate::table::{Field, Record, Table};

/// Current manifest format version.
pub const FORMAT_VERSION: u32 = 1;

/// Manifest listing the persisted tables.
#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Format version
    pub version: u32,
    /// Table names in save order
    pub tables: Vec<String>,
    /// CRC32 of each table file, by table name
    #[serde(default)]
    pub checksums: BTreeMap<String, u32>,
}

/// One table: name, key field name and records as JSON objects.
///
/// Each record object lists the key field first and then the remaining
/// fields in record order.
#[derive(Debug, Serialize, Deserialize)]
pub struct TableFile {
    /// Table name
    pub name: String,
    /// Key field name
    pub key: String,
    /// Records, one object per record
    pub records: Vec<RecordObject>,
}

/// One record as the ordered entries of its JSON object.
///
/// Repeated names are kept so that loading can reject them instead of
/// silently keeping the last value.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordObject(pub Vec<(String, Value)>);

impl Serialize for RecordObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RecordObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RecordObject;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a record object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, Value>()? {
                    entries.push(entry);
                }
                Ok(RecordObject(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl TableFile {
    /// Captures a snapshot of the table.
    pub fn from_table(table: &Table) -> Result<Self, DbError> {
        let records: Vec<RecordObject> = table
            .get_records()?
            .iter()
            .map(|record| {
                RecordObject(
                    record
                        .iter()
                        .map(|f| (f.name().to_string(), Value::String(f.value().to_string())))
                        .collect(),
                )
            })
            .collect();

        Ok(Self {
            name: table.name().to_string(),
            key: table.key().to_string(),
            records,
        })
    }

    /// Rebuilds a table, enforcing the same rules as inserts.
    pub fn into_table(self) -> Result<Table, DbError> {
        let mut records = Vec::with_capacity(self.records.len());
        for (position, object) in self.records.into_iter().enumerate() {
            records.push(record_from_object(&self.name, &self.key, position, object)?);
        }
        Table::with_records(self.name, self.key, records)
    }
}

/// Renders a record as a JSON object, key field first.
pub fn record_to_object(record: &Record) -> Map<String, Value> {
    record
        .iter()
        .map(|f| (f.name().to_string(), Value::String(f.value().to_string())))
        .collect()
}

/// Builds a record with the first entry named `key` as its key field.
///
/// Every other entry, including a repeated key name, becomes a field, so
/// duplicates reach `Table::with_records` and are rejected there.
fn record_from_object(
    table: &str,
    key: &str,
    position: usize,
    object: RecordObject,
) -> Result<Record, DbError> {
    let mut entries = object.0;
    let key_position = entries
        .iter()
        .position(|(name, _)| name == key)
        .ok_or_else(|| {
            DbError::SerializationError(format!(
                "Record {} of table '{}' has no key field '{}'",
                position, table, key
            ))
        })?;
    let (_, key_value) = entries.remove(key_position);
    let key_field = Field::new(key, value_to_string(table, key, &key_value)?);

    let fields = entries
        .iter()
        .map(|(name, value)| Ok(Field::new(name.as_str(), value_to_string(table, name, value)?)))
        .collect::<Result<Vec<Field>, DbError>>()?;
    Ok(Record::with_fields(key_field, fields))
}

/// Field values are strings; numbers and booleans are accepted as their text.
fn value_to_string(table: &str, field: &str, value: &Value) -> Result<String, DbError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(DbError::SerializationError(format!(
            "Field '{}' in table '{}' has unsupported value {}",
            field, table, other
        ))),
    }
}
