//! Backend dialects for the retention state machine.
//!
//! ISM (OpenSearch Index State Management) and ILM (Elasticsearch Index
//! Lifecycle Management) are two encodings of the same abstract policy.
//! A dialect translates the policy into documents and requests; it holds
//! no business logic of its own.

use serde_json::{json, Value};

use export_transport::{ApiRequest, ApiResponse};

use crate::error::RetentionError;
use crate::manager::ConcurrencyToken;
use crate::policy::{RetentionPolicy, DELETE_STATE, INITIAL_STATE};

/// Translation of the abstract retention machine into one backend's API.
pub trait RetentionDialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Policy document for this dialect.
    fn encode_policy(&self, policy: &RetentionPolicy) -> Value;

    /// Upsert the policy. Dialects whose backend supports conditional
    /// writes thread the token into the request so a stale writer is
    /// rejected natively; the others rely on the manager's prior read.
    fn put_policy_request(
        &self,
        policy: &RetentionPolicy,
        token: Option<&ConcurrencyToken>,
    ) -> ApiRequest;

    fn get_policy_request(&self, policy_id: &str) -> ApiRequest;

    fn delete_policy_request(&self, policy_id: &str) -> ApiRequest;

    /// Attach the policy to every index matching the pattern.
    fn apply_policy_request(&self, policy_id: &str, index_pattern: &str) -> ApiRequest;

    /// Detach the policy from every index matching the pattern.
    fn remove_policy_request(&self, index_pattern: &str) -> ApiRequest;

    /// Extract the concurrency token from a get-policy response.
    fn parse_token(&self, response: &ApiResponse) -> Result<ConcurrencyToken, RetentionError>;
}

/// OpenSearch Index State Management encoding.
pub struct IsmDialect;

impl RetentionDialect for IsmDialect {
    fn name(&self) -> &'static str {
        "ism"
    }

    fn encode_policy(&self, policy: &RetentionPolicy) -> Value {
        json!({
            "policy": {
                "policy_id": policy.policy_id,
                "description": policy.description,
                "default_state": INITIAL_STATE,
                "states": [
                    {
                        "name": INITIAL_STATE,
                        "actions": [],
                        "transitions": [
                            {
                                "state_name": DELETE_STATE,
                                "conditions": { "min_index_age": policy.minimum_age }
                            }
                        ]
                    },
                    {
                        "name": DELETE_STATE,
                        "actions": [ { "delete": {} } ],
                        "transitions": []
                    }
                ],
                "ism_template": {
                    "index_patterns": [policy.index_pattern],
                    "priority": 1
                }
            }
        })
    }

    fn put_policy_request(
        &self,
        policy: &RetentionPolicy,
        token: Option<&ConcurrencyToken>,
    ) -> ApiRequest {
        let path = match token {
            Some(token) => format!(
                "/_plugins/_ism/policies/{}?if_seq_no={}&if_primary_term={}",
                policy.policy_id, token.seq_no, token.primary_term
            ),
            None => format!("/_plugins/_ism/policies/{}", policy.policy_id),
        };
        ApiRequest::put(path, self.encode_policy(policy).to_string())
    }

    fn get_policy_request(&self, policy_id: &str) -> ApiRequest {
        ApiRequest::get(format!("/_plugins/_ism/policies/{}", policy_id))
    }

    fn delete_policy_request(&self, policy_id: &str) -> ApiRequest {
        ApiRequest::delete(format!("/_plugins/_ism/policies/{}", policy_id))
    }

    fn apply_policy_request(&self, policy_id: &str, index_pattern: &str) -> ApiRequest {
        ApiRequest::post(
            format!("/_plugins/_ism/add/{}", index_pattern),
            Some(json!({ "policy_id": policy_id }).to_string()),
        )
    }

    fn remove_policy_request(&self, index_pattern: &str) -> ApiRequest {
        ApiRequest::post(format!("/_plugins/_ism/remove/{}", index_pattern), None)
    }

    fn parse_token(&self, response: &ApiResponse) -> Result<ConcurrencyToken, RetentionError> {
        let body: Value = response.json().map_err(RetentionError::Transport)?;
        let seq_no = body
            .get("_seq_no")
            .and_then(Value::as_u64)
            .ok_or_else(|| RetentionError::Response("missing _seq_no".to_string()))?;
        let primary_term = body
            .get("_primary_term")
            .and_then(Value::as_u64)
            .ok_or_else(|| RetentionError::Response("missing _primary_term".to_string()))?;
        Ok(ConcurrencyToken::new(seq_no, primary_term))
    }
}

/// Elasticsearch Index Lifecycle Management encoding.
///
/// ILM has no explicit state list; the `initial` state is implicit and the
/// delete phase with `min_age` encodes the transition plus the delete
/// action.
pub struct IlmDialect;

impl RetentionDialect for IlmDialect {
    fn name(&self) -> &'static str {
        "ilm"
    }

    fn encode_policy(&self, policy: &RetentionPolicy) -> Value {
        json!({
            "policy": {
                "_meta": { "description": policy.description },
                "phases": {
                    (DELETE_STATE): {
                        "min_age": policy.minimum_age,
                        "actions": { "delete": {} }
                    }
                }
            }
        })
    }

    fn put_policy_request(
        &self,
        policy: &RetentionPolicy,
        _token: Option<&ConcurrencyToken>,
    ) -> ApiRequest {
        // The ILM put-policy API accepts no conditional parameters; the
        // manager guards updates by comparing the policy version read
        // beforehand, so the write itself is a plain put.
        ApiRequest::put(
            format!("/_ilm/policy/{}", policy.policy_id),
            self.encode_policy(policy).to_string(),
        )
    }

    fn get_policy_request(&self, policy_id: &str) -> ApiRequest {
        ApiRequest::get(format!("/_ilm/policy/{}", policy_id))
    }

    fn delete_policy_request(&self, policy_id: &str) -> ApiRequest {
        ApiRequest::delete(format!("/_ilm/policy/{}", policy_id))
    }

    fn apply_policy_request(&self, policy_id: &str, index_pattern: &str) -> ApiRequest {
        ApiRequest::put(
            format!("/{}/_settings", index_pattern),
            json!({ "index": { "lifecycle": { "name": policy_id } } }).to_string(),
        )
    }

    fn remove_policy_request(&self, index_pattern: &str) -> ApiRequest {
        ApiRequest::put(
            format!("/{}/_settings", index_pattern),
            json!({ "index": { "lifecycle": { "name": Value::Null } } }).to_string(),
        )
    }

    fn parse_token(&self, response: &ApiResponse) -> Result<ConcurrencyToken, RetentionError> {
        let body: Value = response.json().map_err(RetentionError::Transport)?;
        // ILM reports a policy version instead of a seq-no/primary-term
        // pair; fold it into the same opaque token shape.
        let version = body
            .as_object()
            .and_then(|policies| policies.values().next())
            .and_then(|policy| policy.get("version"))
            .and_then(Value::as_u64)
            .ok_or_else(|| RetentionError::Response("missing policy version".to_string()))?;
        Ok(ConcurrencyToken::new(version, 0))
    }
}
