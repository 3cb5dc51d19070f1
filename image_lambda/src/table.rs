use std::collections::BTreeMap;

use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};

use crate::error::{PipelineError, Result};

/// Partition key of every metadata record.
pub const PATH_ATTRIBUTE: &str = "path";

/// The metadata table, one item per uploaded object keyed by its path.
#[derive(Clone, Debug)]
pub struct MetadataTable {
    client: aws_sdk_dynamodb::Client,
    table: String,
}

impl MetadataTable {
    pub fn new(client: aws_sdk_dynamodb::Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.table
    }

    /// Writes a whole record, replacing any existing item with the same path.
    #[tracing::instrument(skip(self, attributes), fields(table = %self.table, attributes = attributes.len()))]
    pub async fn put_record(&self, key: &str, attributes: &BTreeMap<String, String>) -> Result<()> {
        let item = attributes
            .iter()
            .map(|(name, value)| (name.clone(), AttributeValue::S(value.clone())))
            .chain(std::iter::once((
                PATH_ATTRIBUTE.to_string(),
                AttributeValue::S(key.to_string()),
            )))
            .collect();

        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| PipelineError::dependency("could not put item, dynamodb", e))?;

        Ok(())
    }

    /// Sets a single string attribute on the record at `key`.
    #[tracing::instrument(skip(self), fields(table = %self.table))]
    pub async fn update_attribute(&self, key: &str, attribute: &str, value: &str) -> Result<()> {
        self.client
            .update_item()
            .table_name(&self.table)
            .key(PATH_ATTRIBUTE, AttributeValue::S(key.to_string()))
            .update_expression("SET #attribute = :value")
            .expression_attribute_names("#attribute", attribute)
            .expression_attribute_values(":value", AttributeValue::S(value.to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| {
                PipelineError::dependency(format!("could not update {attribute} on {key}"), e)
            })?;

        Ok(())
    }
}
