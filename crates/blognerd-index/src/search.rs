use anyhow::{anyhow, Result};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::sync::Arc;
use tokio::runtime::Runtime;

use blognerd_core::traits::{Embedder, VectorIndex};
use blognerd_core::types::{
    EmbedPurpose, EmbeddingVector, IndexQuery, Namespaces, QueryInput, RawMatch, Scope,
};
use blognerd_core::Error;

use crate::records::{batch_to_matches, to_record_batch, vector_at, IndexDocument};
use crate::schema::{build_arrow_schema, ID, VECTOR};
use crate::sql::to_where_clause;
use crate::table::{ensure_table, open_db, open_if_exists, quote};

/// Synchronous handle over a LanceDB database holding one table per namespace.
pub struct LanceIndex {
    rt: Runtime,
    db: Connection,
    namespaces: Namespaces,
    dim: usize,
    text_embedder: Option<Arc<dyn Embedder>>,
}

impl LanceIndex {
    pub fn open(uri: &str, namespaces: Namespaces, dim: usize) -> Result<Self> {
        let rt = Runtime::new()?;
        let db = rt.block_on(open_db(uri))?;
        tracing::debug!(
            uri,
            pages = %namespaces.pages,
            feeds = %namespaces.feeds,
            "opened LanceDB"
        );
        Ok(Self { rt, db, namespaces, dim, text_embedder: None })
    }

    /// Embedder used for `QueryInput::Text` requests.
    pub fn with_text_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.text_embedder = Some(embedder);
        self
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn namespaces(&self) -> &Namespaces { &self.namespaces }

    fn scope(&self, namespace: &str) -> Result<Scope> {
        self.namespaces
            .scope_of(namespace)
            .ok_or_else(|| anyhow!("unknown namespace '{}'", namespace))
    }

    fn check_dim(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            let actual = vector.len();
            return Err(Error::DimensionMismatch { expected: self.dim, actual }.into());
        }
        Ok(())
    }

    /// Insert or replace documents by id. Returns the number written.
    pub fn upsert(&self, namespace: &str, docs: &[IndexDocument]) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }
        let scope = self.scope(namespace)?;
        for doc in docs {
            self.check_dim(&doc.vector)?;
        }
        let batch = to_record_batch(scope, self.dim, docs)?;
        let schema = batch.schema();
        self.rt.block_on(async {
            let table =
                ensure_table(&self.db, namespace, build_arrow_schema(scope, self.dim)).await?;
            let reader = Box::new(arrow_array::RecordBatchIterator::new(
                vec![Ok(batch)].into_iter(),
                schema,
            ));
            let mut mi = table.merge_insert(&[ID]);
            mi.when_matched_update_all(None).when_not_matched_insert_all();
            mi.execute(reader).await?;
            Ok::<_, anyhow::Error>(())
        })?;
        tracing::debug!(namespace, rows = docs.len(), "upserted");
        Ok(docs.len())
    }

    pub fn count(&self, namespace: &str) -> Result<usize> {
        self.rt.block_on(async {
            match open_if_exists(&self.db, namespace).await? {
                Some(table) => Ok::<_, anyhow::Error>(table.count_rows(None).await?),
                None => Ok(0),
            }
        })
    }

    /// Stored vector for `id`, if the document exists.
    pub fn fetch_vector(&self, namespace: &str, id: &str) -> Result<Option<EmbeddingVector>> {
        self.rt.block_on(async {
            let Some(table) = open_if_exists(&self.db, namespace).await? else {
                return Ok::<_, anyhow::Error>(None);
            };
            let mut stream = table
                .query()
                .only_if(format!("{} = {}", ID, quote(id)))
                .limit(1)
                .execute()
                .await?;
            while let Some(batch) = stream.try_next().await? {
                if batch.num_rows() == 0 {
                    continue;
                }
                let list = batch
                    .column_by_name(VECTOR)
                    .and_then(|c| c.as_any().downcast_ref::<arrow_array::FixedSizeListArray>())
                    .ok_or_else(|| anyhow!("vector column missing"))?;
                return Ok(Some(vector_at(list, 0)?));
            }
            Ok(None)
        })
    }

    fn query_vector(&self, input: &QueryInput) -> Result<EmbeddingVector> {
        match input {
            QueryInput::Vector(v) => Ok(v.clone()),
            QueryInput::Text(text) => {
                let embedder = self
                    .text_embedder
                    .as_ref()
                    .ok_or_else(|| anyhow!("text queries need an embedder"))?;
                embedder
                    .embed_batch(&[text.clone()], EmbedPurpose::Query)?
                    .pop()
                    .ok_or_else(|| anyhow!("embedder returned no vector"))
            }
        }
    }
}

impl VectorIndex for LanceIndex {
    fn query(&self, request: &IndexQuery) -> Result<Vec<RawMatch>> {
        let scope = self.scope(&request.namespace)?;
        let vector = self.query_vector(&request.input)?;
        self.check_dim(&vector)?;
        let where_clause = to_where_clause(&request.filter, &build_arrow_schema(scope, self.dim))?;

        let matches = self.rt.block_on(async {
            let Some(table) = open_if_exists(&self.db, &request.namespace).await? else {
                tracing::warn!(namespace = %request.namespace, "namespace has no table yet");
                return Ok::<_, anyhow::Error>(Vec::new());
            };
            let mut query = table
                .vector_search(vector)?
                .distance_type(DistanceType::Cosine)
                .limit(request.top_k);
            if let Some(sql) = &where_clause {
                query = query.only_if(sql.as_str());
            }
            let mut stream = query.execute().await?;
            let mut out = Vec::new();
            while let Some(batch) = stream.try_next().await? {
                out.extend(batch_to_matches(&batch, scope, request.include_values)?);
            }
            Ok(out)
        })?;
        tracing::info!(
            namespace = %request.namespace,
            matches = matches.len(),
            filter = ?where_clause,
            "vector query"
        );
        Ok(matches)
    }
}
