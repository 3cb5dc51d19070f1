//! Embedded image metadata, flattened into one table record per upload.

use std::collections::BTreeMap;
use std::io::Cursor;

use exif::{Exif, Field, In, Value};

use crate::error::Result;
use crate::key::ImageKey;
use crate::store::ObjectStore;
use crate::table::MetadataTable;

/// A flattened metadata row: the object path plus tag name to value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub path: String,
    pub attributes: BTreeMap<String, String>,
}

/// Visits every field of the primary image, in file order.
fn walk_fields<F>(exif: &Exif, mut visit: F)
where
    F: FnMut(&str, String),
{
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        visit(&field.tag.to_string(), field_value(field, exif));
    }
}

fn field_value(field: &Field, exif: &Exif) -> String {
    match &field.value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|part| {
                String::from_utf8_lossy(part)
                    .trim_end_matches('\0')
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join(", "),
        _ => field.display_value().with_unit(exif).to_string(),
    }
}

/// Reads the tag/value pairs embedded in a JPEG or PNG.
///
/// Images without a metadata block produce an empty mapping.
pub fn extract_tags(source: &[u8]) -> Result<BTreeMap<String, String>> {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(source)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => {
            tracing::debug!("image carries no embedded metadata");
            return Ok(BTreeMap::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut tags = BTreeMap::new();
    walk_fields(&exif, |name, value| {
        if !name.is_empty() {
            tags.insert(name.to_string(), value);
        }
    });
    Ok(tags)
}

/// Extracts the metadata of `source` and writes it as the record for `key`.
#[tracing::instrument(skip(table, source), fields(table = table.name()))]
pub async fn store_record(
    table: &MetadataTable,
    key: &str,
    source: &[u8],
) -> Result<MetadataRecord> {
    let attributes = extract_tags(source)?;
    if attributes.is_empty() {
        tracing::warn!(key, "no metadata tags found, writing a record with only its path");
    }

    table.put_record(key, &attributes).await?;
    tracing::info!(key, attributes = attributes.len(), "saved metadata");

    Ok(MetadataRecord {
        path: key.to_string(),
        attributes,
    })
}

/// Extracts the tags of a local image, recording them under `key` only when a
/// table is given.
pub async fn inspect(
    table: Option<&MetadataTable>,
    key: &str,
    source: &[u8],
) -> Result<BTreeMap<String, String>> {
    match table {
        Some(table) => Ok(store_record(table, key, source).await?.attributes),
        None => extract_tags(source),
    }
}

/// `name: value` lines with names right-aligned, in name order.
pub fn tag_lines(tags: &BTreeMap<String, String>) -> impl Iterator<Item = String> + '_ {
    tags.iter().map(|(name, value)| format!("{name:>40}: {value}"))
}

/// Reads `bucket/key` and records its metadata.
///
/// Only `uploads/<name>.(jpg|png)` keys are processed; anything else is a
/// validation error raised before the object is read.
pub async fn save_metadata(
    store: &ObjectStore,
    table: &MetadataTable,
    bucket: &str,
    key: &str,
) -> Result<MetadataRecord> {
    ImageKey::parse_upload(key)?;
    let source = store.get(bucket, key).await?;
    store_record(table, key, &source).await
}
