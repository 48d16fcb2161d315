//! Firestore REST profile store.
//!
//! Reads `{collection}/{uid}` through the Firestore v1 REST API via
//! `reqwest`. A 404 means the profile does not exist.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cfy_config::FirebaseConfig;
use cfy_core::ProfileDocument;
use serde::Deserialize;

use crate::ProfileStore;
use crate::error::StoreError;

const FIRESTORE_BASE: &str = "https://firestore.googleapis.com";

/// Supplies the bearer token for each request, if any.
pub type TokenSource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

pub struct FirestoreProfileStore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    collection: String,
    token: Option<TokenSource>,
}

impl std::fmt::Debug for FirestoreProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreProfileStore")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    /// Typed values, e.g. `{"stringValue": "alice"}` or `{"nullValue": null}`.
    #[serde(default)]
    fields: HashMap<String, serde_json::Value>,
}

impl FirestoreProfileStore {
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: FIRESTORE_BASE.to_string(),
            project_id: config.project_id.clone(),
            collection: config.profile_collection.clone(),
            token: None,
        }
    }

    /// Point at a different host, e.g. the local emulator at `http://127.0.0.1:8080`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Authorize requests with the signed-in user's ID token.
    #[must_use]
    pub fn with_token_source(mut self, token: TokenSource) -> Self {
        self.token = Some(token);
        self
    }

    fn document_url(&self, uid: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}/{}",
            self.base_url,
            self.project_id,
            self.collection,
            urlencoding::encode(uid)
        )
    }

    /// GET the document; `Ok(None)` on 404.
    async fn fetch(
        &self,
        uid: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<reqwest::Response>, StoreError> {
        let mut request = self.client.get(self.document_url(uid)).query(query);
        if let Some(token) = self.token.as_ref().and_then(|source| source()) {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("get {uid}: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Unauthorized(format!("HTTP {status}: {body}")));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!("get {uid}: HTTP {status}: {body}")));
        }
        Ok(Some(resp))
    }
}

#[async_trait]
impl ProfileStore for FirestoreProfileStore {
    async fn exists(&self, uid: &str) -> Result<bool, StoreError> {
        // Masking to the document name keeps the existence probe small.
        let found = self.fetch(uid, &[("mask.fieldPaths", "__name__")]).await?;
        Ok(found.is_some())
    }

    async fn get(&self, uid: &str) -> Result<Option<ProfileDocument>, StoreError> {
        let Some(resp) = self.fetch(uid, &[]).await? else {
            return Ok(None);
        };
        let doc: FirestoreDocument = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("{uid}: {e}")))?;
        decode_profile(doc).map(Some)
    }
}

fn decode_profile(doc: FirestoreDocument) -> Result<ProfileDocument, StoreError> {
    let mut fields = doc.fields;
    let mut take = |key: &str| -> Result<Option<String>, StoreError> {
        let Some(value) = fields.remove(key) else {
            return Ok(None);
        };
        if let Some(s) = value.get("stringValue").and_then(serde_json::Value::as_str) {
            return Ok(Some(s.to_string()));
        }
        if value.get("nullValue").is_some() {
            return Ok(None);
        }
        Err(StoreError::Decode(format!("field '{key}' is not a string")))
    };

    let key = doc.name.rsplit('/').next().unwrap_or_default().to_string();
    let uid = take("uid")?.unwrap_or(key);
    let username = take("username")?
        .ok_or_else(|| StoreError::Decode(format!("{uid}: missing 'username'")))?;

    Ok(ProfileDocument {
        codeforces_handle: take("codeforcesHandle")?,
        codechef_handle: take("codechefHandle")?,
        uid,
        username,
    })
}
