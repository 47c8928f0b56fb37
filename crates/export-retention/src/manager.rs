//! Retention policy manager.
//!
//! Owns the policy lifecycle against one backend dialect: idempotent
//! create/delete, optimistically-concurrent update, and pattern-scoped bulk
//! apply/remove across the indices this exporter owns. Write operations run
//! at most once per engine-version upgrade event, not under contention.

use std::sync::Arc;

use tracing::{debug, info};

use export_transport::SearchTransport;
use export_types::{IndexConfig, RetentionConfig};

use crate::dialect::RetentionDialect;
use crate::error::RetentionError;
use crate::policy::RetentionPolicy;

/// Opaque optimistic-concurrency token.
///
/// Returned by reads and required by updates; a stale token fails the
/// update with [`RetentionError::ConcurrencyConflict`] instead of silently
/// overwriting a concurrently-modified policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyToken {
    pub(crate) seq_no: u64,
    pub(crate) primary_term: u64,
}

impl ConcurrencyToken {
    pub fn new(seq_no: u64, primary_term: u64) -> Self {
        Self {
            seq_no,
            primary_term,
        }
    }
}

const CONFLICT_STATUS: u16 = 409;
const NOT_FOUND_STATUS: u16 = 404;

/// Manages the age-based deletion policy for the exporter's indices.
pub struct RetentionPolicyManager {
    transport: Arc<dyn SearchTransport>,
    dialect: Box<dyn RetentionDialect>,
    policy: RetentionPolicy,
}

impl RetentionPolicyManager {
    pub fn new(
        transport: Arc<dyn SearchTransport>,
        dialect: Box<dyn RetentionDialect>,
        retention: &RetentionConfig,
        index: &IndexConfig,
    ) -> Self {
        Self {
            transport,
            dialect,
            policy: RetentionPolicy::from_config(retention, index),
        }
    }

    /// The policy this manager maintains.
    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Idempotent upsert of the policy.
    pub async fn create_policy(&self) -> Result<(), RetentionError> {
        let request = self.dialect.put_policy_request(&self.policy, None);
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(RetentionError::Backend {
                operation: "create",
                status: response.status,
                reason: response.text(),
            });
        }
        info!(
            policy_id = %self.policy.policy_id,
            dialect = self.dialect.name(),
            minimum_age = %self.policy.minimum_age,
            "Created retention policy"
        );
        Ok(())
    }

    /// Fetch the policy's current concurrency token.
    pub async fn read_policy_token(&self) -> Result<ConcurrencyToken, RetentionError> {
        let request = self.dialect.get_policy_request(&self.policy.policy_id);
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(RetentionError::Backend {
                operation: "read",
                status: response.status,
                reason: response.text(),
            });
        }
        self.dialect.parse_token(&response)
    }

    /// Update the policy, guarded by the token from a prior read.
    ///
    /// The token is verified against the current state first, then threaded
    /// into the conditional write so backends that enforce it natively
    /// reject stale writers too. Either path surfaces as
    /// [`RetentionError::ConcurrencyConflict`].
    pub async fn update_policy(&self, token: ConcurrencyToken) -> Result<(), RetentionError> {
        let current = self.read_policy_token().await?;
        if current != token {
            return Err(RetentionError::ConcurrencyConflict {
                policy_id: self.policy.policy_id.clone(),
            });
        }

        let request = self.dialect.put_policy_request(&self.policy, Some(&token));
        let response = self.transport.execute(request).await?;
        if response.status == CONFLICT_STATUS {
            return Err(RetentionError::ConcurrencyConflict {
                policy_id: self.policy.policy_id.clone(),
            });
        }
        if !response.is_success() {
            return Err(RetentionError::Backend {
                operation: "update",
                status: response.status,
                reason: response.text(),
            });
        }
        info!(policy_id = %self.policy.policy_id, "Updated retention policy");
        Ok(())
    }

    /// Idempotent removal of the policy; a missing policy is not an error.
    pub async fn delete_policy(&self) -> Result<(), RetentionError> {
        let request = self.dialect.delete_policy_request(&self.policy.policy_id);
        let response = self.transport.execute(request).await?;
        if response.status == NOT_FOUND_STATUS {
            debug!(policy_id = %self.policy.policy_id, "Policy already absent");
            return Ok(());
        }
        if !response.is_success() {
            return Err(RetentionError::Backend {
                operation: "delete",
                status: response.status,
                reason: response.text(),
            });
        }
        info!(policy_id = %self.policy.policy_id, "Deleted retention policy");
        Ok(())
    }

    /// Attach the policy to every index the exporter owns.
    ///
    /// The scope is exactly the owned-index pattern; indices that share the
    /// literal prefix but not the owned delimiter are never touched.
    pub async fn apply_policy_to_owned_indices(&self) -> Result<(), RetentionError> {
        let request = self
            .dialect
            .apply_policy_request(&self.policy.policy_id, &self.policy.index_pattern);
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(RetentionError::Backend {
                operation: "apply",
                status: response.status,
                reason: response.text(),
            });
        }
        info!(
            policy_id = %self.policy.policy_id,
            pattern = %self.policy.index_pattern,
            "Applied retention policy to owned indices"
        );
        Ok(())
    }

    /// Detach the policy from every index the exporter owns.
    pub async fn remove_policy_from_owned_indices(&self) -> Result<(), RetentionError> {
        let request = self
            .dialect
            .remove_policy_request(&self.policy.index_pattern);
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(RetentionError::Backend {
                operation: "remove",
                status: response.status,
                reason: response.text(),
            });
        }
        info!(
            policy_id = %self.policy.policy_id,
            pattern = %self.policy.index_pattern,
            "Removed retention policy from owned indices"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use export_transport::{ApiRequest, ApiResponse, Method, TransportError};

    use crate::dialect::{IlmDialect, IsmDialect};

    /// Fake ISM backend: one policy slot with a seq-no, plus an index store
    /// that pattern-matches apply/remove requests the way the real backend
    /// expands wildcards.
    #[derive(Default)]
    struct FakeIsmBackend {
        policy: Mutex<Option<(String, u64)>>,
        /// index name -> attached policy id
        indices: Mutex<BTreeMap<String, Option<String>>>,
    }

    impl FakeIsmBackend {
        fn with_indices(names: &[&str]) -> Arc<Self> {
            let backend = Self::default();
            let mut indices = backend.indices.lock().unwrap();
            for name in names {
                indices.insert(name.to_string(), None);
            }
            drop(indices);
            Arc::new(backend)
        }

        fn policy_of(&self, index: &str) -> Option<String> {
            self.indices.lock().unwrap().get(index).cloned().flatten()
        }

        fn matches(pattern: &str, name: &str) -> bool {
            match pattern.strip_suffix('*') {
                Some(prefix) => name.starts_with(prefix),
                None => name == pattern,
            }
        }
    }

    #[async_trait]
    impl SearchTransport for FakeIsmBackend {
        async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
            let path = request.path.as_str();

            if let Some(rest) = path.strip_prefix("/_plugins/_ism/policies/") {
                let (id, condition) = match rest.split_once('?') {
                    Some((id, query)) => (id, Some(query.to_string())),
                    None => (rest, None),
                };
                match request.method {
                    Method::Put => {
                        let mut slot = self.policy.lock().unwrap();
                        if let Some(query) = condition {
                            let current = slot.as_ref().map(|(_, seq)| *seq).unwrap_or(0);
                            if !query.contains(&format!("if_seq_no={}&", current)) {
                                return Ok(ApiResponse::new(409, b"version conflict".to_vec()));
                            }
                        }
                        let next_seq = slot.as_ref().map(|(_, seq)| seq + 1).unwrap_or(0);
                        *slot = Some((request.body.unwrap_or_default(), next_seq));
                        return Ok(ApiResponse::new(200, b"{}".to_vec()));
                    }
                    Method::Get => {
                        return match slot_response(&self.policy, id) {
                            Some(response) => Ok(response),
                            None => Ok(ApiResponse::new(404, b"not found".to_vec())),
                        };
                    }
                    Method::Delete => {
                        let mut slot = self.policy.lock().unwrap();
                        return if slot.take().is_some() {
                            Ok(ApiResponse::new(200, b"{}".to_vec()))
                        } else {
                            Ok(ApiResponse::new(404, b"not found".to_vec()))
                        };
                    }
                    _ => {}
                }
            }

            if let Some(pattern) = path.strip_prefix("/_plugins/_ism/add/") {
                let body: serde_json::Value =
                    serde_json::from_str(request.body.as_deref().unwrap_or("{}")).unwrap();
                let policy_id = body["policy_id"].as_str().unwrap_or_default().to_string();
                let mut indices = self.indices.lock().unwrap();
                for (name, attached) in indices.iter_mut() {
                    if Self::matches(pattern, name) {
                        *attached = Some(policy_id.clone());
                    }
                }
                return Ok(ApiResponse::new(200, b"{}".to_vec()));
            }

            if let Some(pattern) = path.strip_prefix("/_plugins/_ism/remove/") {
                let mut indices = self.indices.lock().unwrap();
                for (name, attached) in indices.iter_mut() {
                    if Self::matches(pattern, name) {
                        *attached = None;
                    }
                }
                return Ok(ApiResponse::new(200, b"{}".to_vec()));
            }

            Ok(ApiResponse::new(400, b"unexpected request".to_vec()))
        }
    }

    fn slot_response(
        policy: &Mutex<Option<(String, u64)>>,
        id: &str,
    ) -> Option<ApiResponse> {
        let slot = policy.lock().unwrap();
        slot.as_ref().map(|(_, seq)| {
            let body = format!(
                r#"{{"_id": "{}", "_seq_no": {}, "_primary_term": 1, "policy": {{}}}}"#,
                id, seq
            );
            ApiResponse::new(200, body.into_bytes())
        })
    }

    fn manager(backend: Arc<FakeIsmBackend>) -> RetentionPolicyManager {
        RetentionPolicyManager::new(
            backend,
            Box::new(IsmDialect),
            &RetentionConfig::default(),
            &IndexConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_create_policy_is_idempotent() {
        let backend = FakeIsmBackend::with_indices(&[]);
        let manager = manager(backend.clone());

        manager.create_policy().await.unwrap();
        manager.create_policy().await.unwrap();
        assert!(backend.policy.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_with_current_token_succeeds() {
        let backend = FakeIsmBackend::with_indices(&[]);
        let manager = manager(backend);

        manager.create_policy().await.unwrap();
        let token = manager.read_policy_token().await.unwrap();
        manager.update_policy(token).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_with_stale_token_conflicts() {
        let backend = FakeIsmBackend::with_indices(&[]);
        let manager = manager(backend);

        manager.create_policy().await.unwrap();
        let stale = manager.read_policy_token().await.unwrap();

        // A concurrent writer bumps the policy.
        manager.create_policy().await.unwrap();

        let err = manager.update_policy(stale).await.unwrap_err();
        assert!(matches!(err, RetentionError::ConcurrencyConflict { .. }));
    }

    #[tokio::test]
    async fn test_delete_policy_is_idempotent() {
        let backend = FakeIsmBackend::with_indices(&[]);
        let manager = manager(backend);

        manager.create_policy().await.unwrap();
        manager.delete_policy().await.unwrap();
        // Second delete finds nothing and still succeeds.
        manager.delete_policy().await.unwrap();
    }

    #[tokio::test]
    async fn test_apply_scopes_to_owned_indices_only() {
        let backend = FakeIsmBackend::with_indices(&[
            "flow-record_job_8.7.0_2024-01-01",
            "flow-record_2024-01-01",
            // Sibling component: shares the literal prefix, different
            // delimiter convention. Must never be touched.
            "flow-record-operate-variable-2024-01-01",
        ]);
        let manager = manager(backend.clone());

        manager.create_policy().await.unwrap();
        manager.apply_policy_to_owned_indices().await.unwrap();

        let policy_id = "flow-record-retention-policy".to_string();
        assert_eq!(
            backend.policy_of("flow-record_job_8.7.0_2024-01-01"),
            Some(policy_id.clone())
        );
        assert_eq!(
            backend.policy_of("flow-record_2024-01-01"),
            Some(policy_id)
        );
        assert_eq!(
            backend.policy_of("flow-record-operate-variable-2024-01-01"),
            None
        );
    }

    #[tokio::test]
    async fn test_remove_detaches_owned_indices_only() {
        let backend = FakeIsmBackend::with_indices(&[
            "flow-record_2024-01-01",
            "flow-record-operate-variable-2024-01-01",
        ]);
        // Sibling starts out tagged by someone else's policy.
        backend.indices.lock().unwrap().insert(
            "flow-record-operate-variable-2024-01-01".to_string(),
            Some("other-policy".to_string()),
        );
        let manager = manager(backend.clone());

        manager.create_policy().await.unwrap();
        manager.apply_policy_to_owned_indices().await.unwrap();
        manager.remove_policy_from_owned_indices().await.unwrap();

        assert_eq!(backend.policy_of("flow-record_2024-01-01"), None);
        assert_eq!(
            backend.policy_of("flow-record-operate-variable-2024-01-01"),
            Some("other-policy".to_string())
        );
    }

    #[tokio::test]
    async fn test_ilm_update_sends_plain_put() {
        /// Fake ILM backend: rejects unknown query parameters the way the
        /// real endpoint does, serves a policy version on reads.
        struct FakeIlmBackend {
            puts: Mutex<Vec<String>>,
        }

        #[async_trait]
        impl SearchTransport for FakeIlmBackend {
            async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
                if request.path.contains('?') {
                    return Ok(ApiResponse::new(
                        400,
                        b"unrecognized parameter: [if_seq_no]".to_vec(),
                    ));
                }
                match request.method {
                    Method::Get => Ok(ApiResponse::new(
                        200,
                        br#"{"flow-record-retention-policy": {"version": 3, "policy": {}}}"#
                            .to_vec(),
                    )),
                    Method::Put => {
                        self.puts.lock().unwrap().push(request.path);
                        Ok(ApiResponse::new(200, b"{}".to_vec()))
                    }
                    _ => Ok(ApiResponse::new(400, b"unexpected request".to_vec())),
                }
            }
        }

        let backend = Arc::new(FakeIlmBackend {
            puts: Mutex::new(Vec::new()),
        });
        let manager = RetentionPolicyManager::new(
            backend.clone(),
            Box::new(IlmDialect),
            &RetentionConfig::default(),
            &IndexConfig::default(),
        );

        let token = manager.read_policy_token().await.unwrap();
        manager.update_policy(token).await.unwrap();

        let puts = backend.puts.lock().unwrap();
        assert_eq!(
            puts.as_slice(),
            ["/_ilm/policy/flow-record-retention-policy"]
        );
    }

    #[tokio::test]
    async fn test_ilm_manager_uses_settings_endpoint() {
        /// Records requests so the ILM wiring can be asserted end to end.
        struct Recorder {
            requests: Mutex<Vec<ApiRequest>>,
        }

        #[async_trait]
        impl SearchTransport for Recorder {
            async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
                self.requests.lock().unwrap().push(request);
                Ok(ApiResponse::new(200, b"{}".to_vec()))
            }
        }

        let recorder = Arc::new(Recorder {
            requests: Mutex::new(Vec::new()),
        });
        let manager = RetentionPolicyManager::new(
            recorder.clone(),
            Box::new(IlmDialect),
            &RetentionConfig::default(),
            &IndexConfig::default(),
        );

        manager.create_policy().await.unwrap();
        manager.apply_policy_to_owned_indices().await.unwrap();

        let requests = recorder.requests.lock().unwrap();
        assert_eq!(
            requests[0].path,
            "/_ilm/policy/flow-record-retention-policy"
        );
        assert_eq!(requests[1].path, "/flow-record_*/_settings");
    }
}
