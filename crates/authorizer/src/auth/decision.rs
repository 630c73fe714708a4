//! Authorization decisions returned to the API gateway.
//!
//! The serialized shape is the gateway's custom-authorizer response:
//! a `principalId` plus an IAM-style policy document granting or denying
//! `execute-api:Invoke` on every resource.

use crate::auth::claims::TokenClaims;
use crate::errors::AuthzError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Principal reported on every Deny decision.
///
/// Verified tokens never carry this subject, but consumers still read the
/// effect before the principal.
pub const DENIED_PRINCIPAL: &str = "anonymous";

/// Policy language version understood by the gateway.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Action the policy grants or denies.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Policy effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    /// Lowercase label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        }
    }
}

/// A single policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

/// Policy document attached to a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// Single-statement policy over all resources.
    pub fn invoke_all(effect: Effect) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![PolicyStatement {
                action: INVOKE_ACTION.to_string(),
                effect,
                resource: "*".to_string(),
            }],
        }
    }
}

/// The authorizer's answer for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationDecision {
    pub principal_id: String,
    pub policy_document: PolicyDocument,

    /// Values forwarded to the downstream handler. Allow only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl AuthorizationDecision {
    /// Allow decision for a verified subject.
    pub fn allow(claims: &TokenClaims) -> Self {
        let context = claims.iss.as_ref().map(|iss| {
            let mut context = BTreeMap::new();
            context.insert("issuer".to_string(), iss.clone());
            context
        });

        Self {
            principal_id: claims.sub.clone(),
            policy_document: PolicyDocument::invoke_all(Effect::Allow),
            context,
        }
    }

    /// Deny decision with the fixed sentinel principal.
    pub fn deny() -> Self {
        Self {
            principal_id: DENIED_PRINCIPAL.to_string(),
            policy_document: PolicyDocument::invoke_all(Effect::Deny),
            context: None,
        }
    }

    /// Effect of the (single) statement.
    pub fn effect(&self) -> Effect {
        self.policy_document
            .statement
            .first()
            .map_or(Effect::Deny, |statement| statement.effect)
    }
}

/// Collapse a verification outcome into a decision.
///
/// Every failure becomes the same Deny; the error's detail stays in logs.
pub fn build_decision(outcome: &Result<TokenClaims, AuthzError>) -> AuthorizationDecision {
    match outcome {
        Ok(claims) => AuthorizationDecision::allow(claims),
        Err(_) => AuthorizationDecision::deny(),
    }
}
