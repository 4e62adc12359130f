//! LanceDB connection and housekeeping helpers.
//!
//! `open_or_create` hands back a table, creating it empty when absent.
//! `MetaTable` is a key/value table recording which collections finished
//! ingesting and from which corpus digest.
use anyhow::{anyhow, Result};
use arrow_array::{RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use arrow_schema::Schema;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, Table};
use std::sync::Arc;

use crate::schema::build_meta_schema;

pub const DEFAULT_META_TABLE: &str = "meta";

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn open_or_create(conn: &Connection, name: &str, schema: Arc<Schema>) -> Result<Table> {
    let names = conn.table_names().execute().await?;
    if !names.iter().any(|n| n == name) {
        let empty = RecordBatchIterator::new(vec![].into_iter(), schema);
        conn.create_table(name, Box::new(empty)).execute().await?;
    }
    Ok(conn.open_table(name).execute().await?)
}

/// String keys to string values, one row per key.
pub struct MetaTable {
    table: Table,
}

impl MetaTable {
    pub async fn open(conn: &Connection, name: &str) -> Result<Self> {
        let table = open_or_create(conn, name, build_meta_schema()).await?;
        Ok(Self { table })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut stream = self
            .table
            .query()
            .only_if(key_predicate(key))
            .limit(1)
            .execute()
            .await?;
        while let Some(batch) = stream.try_next().await? {
            if batch.num_rows() == 0 {
                continue;
            }
            let values = batch
                .column_by_name("value")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| anyhow!("meta.value column missing"))?;
            return Ok(Some(values.value(0).to_string()));
        }
        Ok(None)
    }

    /// Insert or overwrite `key`.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let row = RecordBatch::try_new(
            build_meta_schema(),
            vec![
                Arc::new(StringArray::from(vec![key])),
                Arc::new(StringArray::from(vec![value])),
                Arc::new(TimestampMillisecondArray::from(vec![
                    Utc::now().timestamp_millis(),
                ])),
            ],
        )?;
        let reader = RecordBatchIterator::new(vec![Ok(row)].into_iter(), build_meta_schema());
        let mut upsert = self.table.merge_insert(&["key"]);
        upsert
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        upsert.execute(Box::new(reader)).await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.table.delete(&key_predicate(key)).await?;
        Ok(())
    }
}

fn key_predicate(key: &str) -> String {
    format!("key = '{}'", key.replace('\'', "''"))
}
