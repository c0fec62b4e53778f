use crate::config::DatabaseConfig;
use crate::error::{PipelineError, Result};
use crate::structs::{ColumnKind, Table, Value};
use log::debug;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::{MySql, QueryBuilder, Row};
use std::time::Duration;

/// Rows per multi-row INSERT statement.
const INSERT_CHUNK_ROWS: usize = 500;

/// Replaces the destination table with the given table's contents and reads
/// back the first `SAMPLE_ROWS` rows for verification.
///
/// The destination is dropped and recreated from the table's declared column
/// kinds, then filled with chunked multi-row inserts. The connection pool is
/// closed before returning, whether the write succeeded or not.
///
/// # Errors
/// Returns the connection variant when the database is unreachable and the
/// write variant when any statement is rejected.
pub async fn publish(table: &Table, config: &DatabaseConfig) -> Result<Vec<String>> {
    let pool = connect(config).await?;
    let result = replace_and_sample(&pool, table, &config.table).await;
    pool.close().await;
    result
}

const SAMPLE_ROWS: usize = 5;

async fn connect(config: &DatabaseConfig) -> Result<MySqlPool> {
    debug!(
        "Connecting to MySQL at {}:{} database={}",
        config.host, config.port, config.database
    );
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.database);

    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_with(options)
        .await
        .map_err(PipelineError::Connection)
}

async fn replace_and_sample(pool: &MySqlPool, table: &Table, name: &str) -> Result<Vec<String>> {
    sqlx::query(&drop_table_sql(name))
        .execute(pool)
        .await
        .map_err(PipelineError::Write)?;
    sqlx::query(&create_table_sql(name, table))
        .execute(pool)
        .await
        .map_err(PipelineError::Write)?;
    debug!("Recreated table '{}'", name);

    let rows: Vec<usize> = (0..table.num_rows()).collect();
    for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(insert_prefix(name, table));
        builder.push_values(chunk.iter().copied(), |mut b, row| {
            for col in table.columns() {
                match &col.values[row] {
                    Value::Int(v) => {
                        b.push_bind(*v);
                    }
                    Value::Float(v) => {
                        b.push_bind(*v);
                    }
                    Value::Bool(v) => {
                        b.push_bind(*v);
                    }
                    Value::Text(v) => {
                        b.push_bind(v.clone());
                    }
                    Value::Null => match col.kind {
                        ColumnKind::Int => {
                            b.push_bind(None::<i64>);
                        }
                        ColumnKind::Float => {
                            b.push_bind(None::<f64>);
                        }
                        ColumnKind::Bool => {
                            b.push_bind(None::<bool>);
                        }
                        ColumnKind::Text => {
                            b.push_bind(None::<String>);
                        }
                    },
                }
            }
        });
        builder
            .build()
            .execute(pool)
            .await
            .map_err(PipelineError::Write)?;
    }
    debug!("Inserted {} rows into '{}'", table.num_rows(), name);

    fetch_sample(pool, table, name).await
}

async fn fetch_sample(pool: &MySqlPool, table: &Table, name: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(&sample_sql(name, table, SAMPLE_ROWS))
        .fetch_all(pool)
        .await
        .map_err(PipelineError::Write)?;

    let mut rendered = Vec::with_capacity(rows.len());
    for row in rows {
        let mut parts = Vec::with_capacity(table.num_columns());
        for (idx, col) in table.columns().iter().enumerate() {
            let cell = match col.kind {
                ColumnKind::Int => row
                    .try_get::<Option<i64>, _>(idx)
                    .map(|v| v.map(|x| x.to_string())),
                ColumnKind::Float => row
                    .try_get::<Option<f64>, _>(idx)
                    .map(|v| v.map(|x| x.to_string())),
                ColumnKind::Bool => row
                    .try_get::<Option<bool>, _>(idx)
                    .map(|v| v.map(|x| x.to_string())),
                ColumnKind::Text => row.try_get::<Option<String>, _>(idx),
            }
            .map_err(PipelineError::Write)?;
            parts.push(format!(
                "{}={}",
                col.name,
                cell.unwrap_or_else(|| "NULL".to_string())
            ));
        }
        rendered.push(parts.join(", "));
    }
    Ok(rendered)
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn sql_type(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Int => "BIGINT",
        ColumnKind::Float => "DOUBLE",
        ColumnKind::Bool => "BOOLEAN",
        ColumnKind::Text => "TEXT",
    }
}

fn column_list(table: &Table) -> String {
    table
        .columns()
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn drop_table_sql(name: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(name))
}

fn create_table_sql(name: &str, table: &Table) -> String {
    let columns = table
        .columns()
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), sql_type(c.kind)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", quote_ident(name), columns)
}

fn insert_prefix(name: &str, table: &Table) -> String {
    format!(
        "INSERT INTO {} ({}) ",
        quote_ident(name),
        column_list(table)
    )
}

fn sample_sql(name: &str, table: &Table, limit: usize) -> String {
    format!(
        "SELECT {} FROM {} LIMIT {}",
        column_list(table),
        quote_ident(name),
        limit
    )
}
