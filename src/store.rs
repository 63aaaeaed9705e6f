use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use gcloud_gax::grpc::Code;
use gcloud_googleapis::spanner::admin::database::v1::{
    CreateDatabaseRequest, GetDatabaseDdlRequest, GetDatabaseRequest, UpdateDatabaseDdlRequest,
};
use gcloud_googleapis::spanner::admin::instance::v1::{
    CreateInstanceRequest, GetInstanceRequest, Instance,
};
use gcloud_spanner::admin::AdminClientConfig;
use gcloud_spanner::admin::client::Client as AdminClient;
use gcloud_spanner::client::{Client, ClientConfig};
use gcloud_spanner::key::Key;
use gcloud_spanner::mutation::{delete, insert_or_update};
use gcloud_spanner::statement::Statement;
use gcloud_spanner::value::CommitTimestamp;

use crate::article::{Article, AttrValue};
use crate::config::Config;

/// Rows fetched per scan call; a full page carries a continuation marker.
const SCAN_PAGE_SIZE: usize = 100;

/// One page of a full-table scan.
///
/// `continuation` is the marker to feed into the next scan call and is
/// present whenever more rows may remain.
#[derive(Debug, Clone)]
pub struct ScanPage {
    pub items: Vec<Article>,
    pub continuation: Option<String>,
}

/// Shareable handle to the articles table, cloned into every handler.
#[derive(Clone)]
pub struct ArticleStore {
    inner: Arc<Client>,
}

impl ArticleStore {
    /// Connect to Spanner and provision the instance, database and table if
    /// they don't exist yet (zero-setup runs against the emulator).
    ///
    /// The client library picks up SPANNER_EMULATOR_HOST automatically and
    /// connects to production Spanner otherwise.
    pub async fn from_config(config: &Config) -> Result<Self> {
        provision(config).await?;

        let database_path = format!(
            "projects/{}/instances/{}/databases/{}",
            config.spanner_project, config.spanner_instance, config.spanner_database
        );

        if let Some(host) = &config.spanner_emulator_host {
            tracing::info!("Connecting to Spanner emulator at {host}");
        } else {
            tracing::info!("Connecting to production Spanner");
        }

        let client = Client::new(&database_path, ClientConfig::default())
            .await
            .context("failed to create Spanner client")?;

        tracing::info!("Connected to {database_path}");

        Ok(Self {
            inner: Arc::new(client),
        })
    }

    /// Look up a single article by exact key.
    pub async fn get(&self, article_id: &str) -> Result<Option<Article>> {
        let id = article_id.to_string();
        let mut statement = Statement::new("SELECT attrs FROM articles WHERE article_id = @id");
        statement.add_param("id", &id);

        let mut tx = self
            .inner
            .single()
            .await
            .context("failed to open read transaction")?;

        let mut rows = tx
            .query(statement)
            .await
            .context("failed to read article")?;

        if let Some(row) = rows.next().await? {
            let attrs: String = row.column_by_name("attrs")?;
            Ok(Some(Article::from_stored(id, &attrs)?))
        } else {
            Ok(None)
        }
    }

    /// Fetch one key-ordered page of the table.
    ///
    /// Pass the continuation marker of the previous page to resume; a page
    /// that fills up returns its last key as the next marker.
    pub async fn scan_page(&self, start_after: Option<&str>) -> Result<ScanPage> {
        let sql = match start_after {
            Some(_) => format!(
                "SELECT article_id, attrs FROM articles WHERE article_id > @after \
                 ORDER BY article_id LIMIT {SCAN_PAGE_SIZE}"
            ),
            None => {
                format!("SELECT article_id, attrs FROM articles ORDER BY article_id LIMIT {SCAN_PAGE_SIZE}")
            }
        };

        let mut statement = Statement::new(&sql);
        if let Some(after) = start_after {
            let after = after.to_string();
            statement.add_param("after", &after);
        }

        let mut tx = self
            .inner
            .single()
            .await
            .context("failed to open read transaction")?;

        let mut rows = tx
            .query(statement)
            .await
            .context("failed to scan articles")?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.column_by_name("article_id")?;
            let attrs: String = row.column_by_name("attrs")?;
            items.push(Article::from_stored(id, &attrs)?);
        }

        let continuation = if items.len() == SCAN_PAGE_SIZE {
            items.last().map(|a| a.article_id().to_string())
        } else {
            None
        };

        Ok(ScanPage {
            items,
            continuation,
        })
    }

    /// Scan the whole table, following continuation markers until exhausted.
    pub async fn scan_all(&self) -> Result<Vec<Article>> {
        drain_scan(|marker| async move { self.scan_page(marker.as_deref()).await }).await
    }

    /// Write an article as a full replacement at its key. Existing records
    /// are overwritten silently.
    pub async fn put(&self, article: &Article) -> Result<()> {
        let id = article.article_id().to_string();
        let attrs = article.to_stored()?;

        let mutation = insert_or_update(
            "articles",
            &["article_id", "attrs", "created_at", "updated_at"],
            &[&id, &attrs, &CommitTimestamp::new(), &CommitTimestamp::new()],
        );

        self.inner
            .apply(vec![mutation])
            .await
            .context("failed to write article")?;

        tracing::debug!("Stored article {id}");
        Ok(())
    }

    /// Set a single named field on the record, leaving the rest untouched,
    /// and return the new value of the mutated attribute.
    ///
    /// Returns `None` when no record exists under the key. Read-modify-write:
    /// concurrent updates to the same key race with last write wins.
    pub async fn update(
        &self,
        article_id: &str,
        field: &str,
        value: AttrValue,
    ) -> Result<Option<BTreeMap<String, AttrValue>>> {
        let Some(mut article) = self.get(article_id).await? else {
            return Ok(None);
        };

        article.set_field(field, value.clone());
        self.put(&article).await?;

        tracing::debug!("Updated field {field} on article {article_id}");
        Ok(Some(BTreeMap::from([(field.to_string(), value)])))
    }

    /// Delete the record at the key, returning the prior record when one
    /// existed. Deleting an absent key is a no-op.
    pub async fn delete(&self, article_id: &str) -> Result<Option<Article>> {
        let prior = self.get(article_id).await?;

        let id = article_id.to_string();
        self.inner
            .apply(vec![delete("articles", Key::new(&id))])
            .await
            .context("failed to delete article")?;

        tracing::debug!("Deleted article {id} (existed: {})", prior.is_some());
        Ok(prior)
    }
}

/// Drive a paged scan to completion: fetch, append, feed the continuation
/// marker back in, stop once a page comes back without one.
pub async fn drain_scan<F, Fut>(mut next_page: F) -> Result<Vec<Article>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ScanPage>>,
{
    let mut items = Vec::new();
    let mut marker: Option<String> = None;
    loop {
        let page = next_page(marker.take()).await?;
        items.extend(page.items);
        match page.continuation {
            Some(next) => marker = Some(next),
            None => break,
        }
    }
    Ok(items)
}

/// Create the configured instance, database and `articles` table when
/// missing. Idempotent.
async fn provision(config: &Config) -> Result<()> {
    let admin = AdminClient::new(AdminClientConfig::default())
        .await
        .context("failed to create Spanner admin client")?;

    let project_path = format!("projects/{}", config.spanner_project);
    let instance_path = format!("{}/instances/{}", project_path, config.spanner_instance);
    let database_path = format!("{}/databases/{}", instance_path, config.spanner_database);

    ensure_instance(&admin, config, &project_path, &instance_path).await?;
    ensure_database(&admin, &instance_path, &database_path).await?;
    ensure_articles_table(&admin, &database_path).await?;

    Ok(())
}

async fn ensure_instance(
    admin: &AdminClient,
    config: &Config,
    project_path: &str,
    instance_path: &str,
) -> Result<()> {
    let get_request = GetInstanceRequest {
        name: instance_path.to_string(),
        field_mask: None,
    };

    match admin.instance().get_instance(get_request, None).await {
        Ok(_) => Ok(()),
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("Creating Spanner instance {instance_path}");

            let instance_config = if config.spanner_emulator_host.is_some() {
                format!("{project_path}/instanceConfigs/emulator-config")
            } else {
                format!("{project_path}/instanceConfigs/regional-us-central1")
            };

            let create_request = CreateInstanceRequest {
                parent: project_path.to_string(),
                instance_id: config.spanner_instance.clone(),
                instance: Some(Instance {
                    name: instance_path.to_string(),
                    config: instance_config,
                    display_name: format!("{} instance", config.spanner_instance),
                    node_count: 1,
                    ..Default::default()
                }),
            };

            let mut operation = match admin.instance().create_instance(create_request, None).await {
                Ok(operation) => operation,
                // Lost a race with a concurrent boot
                Err(status) if status.code() == Code::AlreadyExists => return Ok(()),
                Err(status) => {
                    return Err(anyhow!("failed to start instance creation: {}", status.message()));
                }
            };

            operation.wait(None).await.context("failed to create instance")?;
            Ok(())
        }
        Err(e) => Err(anyhow!("failed to check instance existence: {}", e.message())),
    }
}

async fn ensure_database(
    admin: &AdminClient,
    instance_path: &str,
    database_path: &str,
) -> Result<()> {
    let get_request = GetDatabaseRequest {
        name: database_path.to_string(),
    };

    match admin.database().get_database(get_request, None).await {
        Ok(_) => Ok(()),
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("Creating Spanner database {database_path}");

            let database_id = database_path
                .split('/')
                .next_back()
                .context("invalid database path")?;

            let create_request = CreateDatabaseRequest {
                parent: instance_path.to_string(),
                create_statement: format!("CREATE DATABASE `{database_id}`"),
                extra_statements: vec![],
                encryption_config: None,
                database_dialect: 1, // Google Standard SQL
                proto_descriptors: vec![],
            };

            let mut operation = match admin.database().create_database(create_request, None).await {
                Ok(operation) => operation,
                Err(status) if status.code() == Code::AlreadyExists => return Ok(()),
                Err(status) => {
                    return Err(anyhow!("failed to start database creation: {}", status.message()));
                }
            };

            operation.wait(None).await.context("failed to create database")?;
            Ok(())
        }
        Err(e) => Err(anyhow!("failed to check database existence: {}", e.message())),
    }
}

async fn ensure_articles_table(admin: &AdminClient, database_path: &str) -> Result<()> {
    if articles_table_exists(admin, database_path).await? {
        return Ok(());
    }

    tracing::info!("Creating table 'articles'");

    if let Err(err) = create_articles_table(admin, database_path).await {
        // A concurrent boot may have created it first
        if articles_table_exists(admin, database_path).await? {
            return Ok(());
        }
        return Err(err);
    }
    Ok(())
}

async fn articles_table_exists(admin: &AdminClient, database_path: &str) -> Result<bool> {
    let ddl_response = admin
        .database()
        .get_database_ddl(
            GetDatabaseDdlRequest {
                database: database_path.to_string(),
            },
            None,
        )
        .await
        .context("failed to get database DDL")?;

    Ok(ddl_response
        .into_inner()
        .statements
        .iter()
        .any(|stmt| stmt.contains("CREATE TABLE articles") || stmt.contains("CREATE TABLE `articles`")))
}

async fn create_articles_table(admin: &AdminClient, database_path: &str) -> Result<()> {
    let create_table_ddl = r#"
CREATE TABLE articles (
    article_id STRING(MAX) NOT NULL,
    attrs JSON NOT NULL,
    created_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
    updated_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
) PRIMARY KEY (article_id)
"#
    .trim()
    .to_string();

    let update_request = UpdateDatabaseDdlRequest {
        database: database_path.to_string(),
        statements: vec![create_table_ddl],
        operation_id: String::new(),
        proto_descriptors: vec![],
        throughput_mode: false,
    };

    let mut operation = admin
        .database()
        .update_database_ddl(update_request, None)
        .await
        .context("failed to start table creation")?;

    operation.wait(None).await.context("failed to create table")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn article(id: &str) -> Article {
        Article::from_json(&json!({ "articleId": id })).unwrap()
    }

    #[test]
    fn test_store_is_clonable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<ArticleStore>();
    }

    #[test]
    fn test_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ArticleStore>();
    }

    #[tokio::test]
    async fn test_drain_scan_single_page() {
        let result = drain_scan(|marker| {
            assert!(marker.is_none());
            let page = ScanPage {
                items: vec![article("a1")],
                continuation: None,
            };
            async move { Ok::<_, anyhow::Error>(page) }
        })
        .await
        .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].article_id(), "a1");
    }

    #[tokio::test]
    async fn test_drain_scan_concatenates_continuation_pages() {
        let calls = Mutex::new(Vec::new());

        let result = drain_scan(|marker| {
            calls.lock().unwrap().push(marker.clone());
            let page = match marker.as_deref() {
                None => ScanPage {
                    items: vec![article("a1"), article("a2")],
                    continuation: Some("a2".to_string()),
                },
                Some("a2") => ScanPage {
                    items: vec![article("a3")],
                    continuation: None,
                },
                Some(other) => panic!("unexpected continuation marker {other}"),
            };
            async move { Ok::<_, anyhow::Error>(page) }
        })
        .await
        .unwrap();

        let ids: Vec<&str> = result.iter().map(|a| a.article_id()).collect();
        assert_eq!(ids, vec!["a1", "a2", "a3"]);
        assert_eq!(*calls.lock().unwrap(), vec![None, Some("a2".to_string())]);
    }

    #[tokio::test]
    async fn test_drain_scan_tolerates_empty_final_page() {
        // A page that fills up exactly reports a marker even when no rows
        // remain; the follow-up scan comes back empty.
        let result = drain_scan(|marker| {
            let page = match marker.as_deref() {
                None => ScanPage {
                    items: vec![article("a1"), article("a2")],
                    continuation: Some("a2".to_string()),
                },
                Some(_) => ScanPage {
                    items: vec![],
                    continuation: None,
                },
            };
            async move { Ok::<_, anyhow::Error>(page) }
        })
        .await
        .unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_drain_scan_propagates_page_errors() {
        let result = drain_scan(|_marker| async move {
            Err::<ScanPage, _>(anyhow!("scan blew up"))
        })
        .await;

        assert!(result.is_err());
    }

    // The tests below need the Spanner emulator (localhost:9010) and skip
    // themselves when it isn't reachable.

    async fn emulator_store(instance: &str, database: &str) -> Option<ArticleStore> {
        unsafe {
            std::env::set_var("SPANNER_EMULATOR_HOST", "localhost:9010");
        }

        let config = Config {
            spanner_emulator_host: Some("localhost:9010".to_string()),
            spanner_project: "test-project".to_string(),
            spanner_instance: instance.to_string(),
            spanner_database: database.to_string(),
            service_host: "0.0.0.0".to_string(),
            service_port: 3000,
        };

        match ArticleStore::from_config(&config).await {
            Ok(store) => Some(store),
            Err(err) => {
                println!("skipping, Spanner emulator not reachable: {err:#}");
                None
            }
        }
    }

    #[tokio::test]
    async fn test_crud_round_trip_against_emulator() {
        let Some(store) = emulator_store("store-crud-test", "store-crud-db").await else {
            return;
        };

        let payload = json!({ "articleId": "a1", "title": "x", "stock": 3 });
        store.put(&Article::from_json(&payload).unwrap()).await.unwrap();

        let read = store.get("a1").await.unwrap().expect("stored article reads back");
        assert_eq!(read.to_plain_json().unwrap(), payload);

        let updated = store
            .update("a1", "title", AttrValue::S("y".to_string()))
            .await
            .unwrap()
            .expect("update against existing key succeeds");
        assert_eq!(updated.get("title"), Some(&AttrValue::S("y".to_string())));

        let after = store.get("a1").await.unwrap().unwrap();
        assert_eq!(
            after.to_plain_json().unwrap(),
            json!({ "articleId": "a1", "title": "y", "stock": 3 })
        );

        let prior = store
            .delete("a1")
            .await
            .unwrap()
            .expect("delete returns the prior record");
        assert_eq!(prior.to_plain_json().unwrap()["title"], "y");

        assert!(store.get("a1").await.unwrap().is_none());
        assert!(store.delete("a1").await.unwrap().is_none());
        assert!(
            store
                .update("a1", "title", AttrValue::S("z".to_string()))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_scan_all_against_emulator() {
        let Some(store) = emulator_store("store-scan-test", "store-scan-db").await else {
            return;
        };

        for id in ["s1", "s2", "s3"] {
            let payload = json!({ "articleId": id, "n": 1 });
            store.put(&Article::from_json(&payload).unwrap()).await.unwrap();
        }

        let all = store.scan_all().await.unwrap();
        let ids: Vec<&str> = all.iter().map(|a| a.article_id()).collect();
        for id in ["s1", "s2", "s3"] {
            assert!(ids.contains(&id), "scan should return {id}");
        }
    }
}
