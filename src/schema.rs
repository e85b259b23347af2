//! Schema inspection
//!
//! Reads the source table's key schema so the destination can be created
//! with matching primary-key attributes.

use aws_sdk_dynamodb::types::{KeyType, ScalarAttributeType, TableDescription};
use aws_sdk_dynamodb::Client;

use crate::error::{sdk_error_message, CopyError};

/// A single primary-key attribute.
///
/// The attribute type is read from the source table's attribute definitions
/// and propagated to creation, rather than assuming every key is a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: ScalarAttributeType,
}

/// The inferred primary key of a table: one partition key, optionally one
/// sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
}

impl KeySchema {
    /// Extract the key schema from a `DescribeTable` result.
    ///
    /// Exactly one HASH element is required; zero or more than one is
    /// rejected rather than silently picking the first. Each key attribute
    /// must carry a matching attribute definition so its scalar type can be
    /// propagated.
    pub fn from_table_description(
        table: &str,
        desc: &TableDescription,
    ) -> Result<Self, CopyError> {
        let schema_err = |message: String| CopyError::Schema {
            table: table.to_string(),
            message,
        };

        let lookup_type = |name: &str| -> Result<ScalarAttributeType, CopyError> {
            desc.attribute_definitions()
                .iter()
                .find(|def| def.attribute_name() == name)
                .map(|def| def.attribute_type().clone())
                .ok_or_else(|| {
                    schema_err(format!("no attribute definition for key attribute '{name}'"))
                })
        };

        let mut hash_keys = Vec::new();
        let mut range_keys = Vec::new();
        for element in desc.key_schema() {
            match element.key_type() {
                KeyType::Hash => hash_keys.push(element.attribute_name().to_string()),
                KeyType::Range => range_keys.push(element.attribute_name().to_string()),
                other => {
                    return Err(schema_err(format!(
                        "unrecognized key type '{}'",
                        other.as_str()
                    )));
                }
            }
        }

        let partition_name = match hash_keys.as_slice() {
            [single] => single.clone(),
            [] => return Err(schema_err("no partition key element".to_string())),
            _ => {
                return Err(schema_err(format!(
                    "expected exactly one partition key element, found {}",
                    hash_keys.len()
                )));
            }
        };

        if range_keys.len() > 1 {
            return Err(schema_err(format!(
                "expected at most one sort key element, found {}",
                range_keys.len()
            )));
        }

        let partition_key = KeyAttribute {
            attribute_type: lookup_type(&partition_name)?,
            name: partition_name,
        };

        let sort_key = match range_keys.into_iter().next() {
            Some(name) => Some(KeyAttribute {
                attribute_type: lookup_type(&name)?,
                name,
            }),
            None => None,
        };

        Ok(Self {
            partition_key,
            sort_key,
        })
    }
}

/// Inspect the source table and return its inferred key schema.
///
/// Any failure of the `DescribeTable` call maps to
/// [`CopyError::SourceNotFound`]: a missing table and a denied one are
/// equally unusable as a copy source.
pub async fn inspect(client: &Client, table: &str) -> Result<KeySchema, CopyError> {
    let output = client
        .describe_table()
        .table_name(table)
        .send()
        .await
        .map_err(|err| {
            tracing::debug!(table = %table, error = %sdk_error_message(&err), "DescribeTable failed");
            CopyError::SourceNotFound(table.to_string())
        })?;

    let desc = output
        .table
        .ok_or_else(|| CopyError::SourceNotFound(table.to_string()))?;

    let schema = KeySchema::from_table_description(table, &desc)?;

    tracing::info!(
        table = %table,
        partition_key = %schema.partition_key.name,
        sort_key = schema.sort_key.as_ref().map(|k| k.name.as_str()),
        "Inferred source key schema"
    );

    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::{AttributeDefinition, KeySchemaElement};

    fn key_element(name: &str, key_type: KeyType) -> KeySchemaElement {
        KeySchemaElement::builder()
            .attribute_name(name)
            .key_type(key_type)
            .build()
            .unwrap()
    }

    fn attr_def(name: &str, attr_type: ScalarAttributeType) -> AttributeDefinition {
        AttributeDefinition::builder()
            .attribute_name(name)
            .attribute_type(attr_type)
            .build()
            .unwrap()
    }

    #[test]
    fn test_partition_key_only() {
        let desc = TableDescription::builder()
            .key_schema(key_element("OrderId", KeyType::Hash))
            .attribute_definitions(attr_def("OrderId", ScalarAttributeType::S))
            .build();

        let schema = KeySchema::from_table_description("Orders", &desc).unwrap();
        assert_eq!(schema.partition_key.name, "OrderId");
        assert_eq!(schema.partition_key.attribute_type, ScalarAttributeType::S);
        assert!(schema.sort_key.is_none());
    }

    #[test]
    fn test_partition_and_sort_key() {
        let desc = TableDescription::builder()
            .key_schema(key_element("OrderId", KeyType::Hash))
            .key_schema(key_element("Timestamp", KeyType::Range))
            .attribute_definitions(attr_def("OrderId", ScalarAttributeType::S))
            .attribute_definitions(attr_def("Timestamp", ScalarAttributeType::S))
            .build();

        let schema = KeySchema::from_table_description("Orders", &desc).unwrap();
        assert_eq!(schema.partition_key.name, "OrderId");
        let sort = schema.sort_key.unwrap();
        assert_eq!(sort.name, "Timestamp");
        assert_eq!(sort.attribute_type, ScalarAttributeType::S);
    }

    #[test]
    fn test_numeric_key_type_propagated() {
        let desc = TableDescription::builder()
            .key_schema(key_element("UserId", KeyType::Hash))
            .key_schema(key_element("Sequence", KeyType::Range))
            .attribute_definitions(attr_def("UserId", ScalarAttributeType::S))
            .attribute_definitions(attr_def("Sequence", ScalarAttributeType::N))
            .build();

        let schema = KeySchema::from_table_description("Events", &desc).unwrap();
        assert_eq!(
            schema.sort_key.unwrap().attribute_type,
            ScalarAttributeType::N
        );
    }

    #[test]
    fn test_no_partition_key_rejected() {
        let desc = TableDescription::builder()
            .key_schema(key_element("Timestamp", KeyType::Range))
            .attribute_definitions(attr_def("Timestamp", ScalarAttributeType::S))
            .build();

        let err = KeySchema::from_table_description("Orders", &desc).unwrap_err();
        assert!(matches!(err, CopyError::Schema { .. }));
    }

    #[test]
    fn test_multiple_partition_keys_rejected() {
        let desc = TableDescription::builder()
            .key_schema(key_element("A", KeyType::Hash))
            .key_schema(key_element("B", KeyType::Hash))
            .attribute_definitions(attr_def("A", ScalarAttributeType::S))
            .attribute_definitions(attr_def("B", ScalarAttributeType::S))
            .build();

        let err = KeySchema::from_table_description("Orders", &desc).unwrap_err();
        assert!(matches!(err, CopyError::Schema { .. }));
    }

    #[test]
    fn test_missing_attribute_definition_rejected() {
        let desc = TableDescription::builder()
            .key_schema(key_element("OrderId", KeyType::Hash))
            .build();

        let err = KeySchema::from_table_description("Orders", &desc).unwrap_err();
        match err {
            CopyError::Schema { message, .. } => {
                assert!(message.contains("OrderId"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
