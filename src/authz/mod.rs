//! Authorization modes and the declarative access rules that select them.
//!
//! Entities are governed by schema-derived [`AccessRule`]s. Each rule pairs
//! an [`AccessStrategy`] with the operations it covers and maps to the
//! [`AuthorizationMode`] a request should authenticate with. The
//! [`resolver`] turns a full rule set into a cached, priority-ordered
//! decision per (entity type, operation).

pub mod resolver;

pub use resolver::{MissingRuleBehavior, ModeResolver};

use std::fmt;

/// Mechanism used to authorize an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationMode {
    /// Hardcoded key for throttled, otherwise-public APIs.
    ApiKey,
    /// Request signing with configured IAM-style credentials.
    IamSigning,
    /// An OpenID Connect token supplied by the caller.
    OpenIdConnect,
    /// Token from the current user-pool session.
    UserPool,
    /// No authorization attached; the request is left to fail downstream.
    None,
    /// Placeholder for "whatever the rule's strategy implies".
    Default,
}

impl AuthorizationMode {
    /// Maps a schema provider name to its mode.
    #[must_use]
    pub fn from_provider_name(name: &str) -> Option<Self> {
        match name {
            "apiKey" => Some(Self::ApiKey),
            "iam" => Some(Self::IamSigning),
            "oidc" => Some(Self::OpenIdConnect),
            "userPools" => Some(Self::UserPool),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::IamSigning => "iam_signing",
            Self::OpenIdConnect => "openid_connect",
            Self::UserPool => "user_pool",
            Self::None => "none",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for AuthorizationMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Access-control strategy named by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessStrategy {
    Owner,
    Group,
    Private,
    Public,
    /// Any strategy outside the fixed set; always lowest priority.
    Custom,
}

impl AccessStrategy {
    /// Position in the fixed priority order; lower wins.
    #[must_use]
    pub fn priority(self) -> u8 {
        match self {
            Self::Owner => 0,
            Self::Group => 1,
            Self::Private => 2,
            Self::Public => 3,
            Self::Custom => 4,
        }
    }

    /// The mode a rule with this strategy authorizes with, absent an
    /// explicit provider override.
    #[must_use]
    pub fn default_mode(self) -> AuthorizationMode {
        match self {
            Self::Owner | Self::Group => AuthorizationMode::UserPool,
            Self::Private => AuthorizationMode::IamSigning,
            Self::Public => AuthorizationMode::ApiKey,
            Self::Custom => AuthorizationMode::None,
        }
    }
}

/// Operation on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    /// Every operation, in cache-build order.
    pub const ALL: [Self; 4] = [Self::Create, Self::Read, Self::Update, Self::Delete];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One declarative access rule from an entity's schema. Rules are consumed
/// as supplied; the library never mutates them.
#[derive(Debug, Clone)]
pub struct AccessRule {
    pub strategy: AccessStrategy,
    /// Explicit provider named by the schema; `None` or
    /// [`AuthorizationMode::Default`] falls back to the strategy mapping.
    pub provider: Option<AuthorizationMode>,
    /// Operations the rule covers; empty covers every operation.
    pub operations: Vec<Operation>,
}

impl AccessRule {
    #[must_use]
    pub fn new(strategy: AccessStrategy) -> Self {
        Self {
            strategy,
            provider: None,
            operations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: AuthorizationMode) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn for_operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations = operations.into_iter().collect();
        self
    }

    /// Whether the rule governs `operation`.
    #[must_use]
    pub fn applies_to(&self, operation: Operation) -> bool {
        self.operations.is_empty() || self.operations.contains(&operation)
    }

    /// The mode this rule authorizes with.
    #[must_use]
    pub fn mode(&self) -> AuthorizationMode {
        match self.provider {
            Some(AuthorizationMode::Default) | None => self.strategy.default_mode(),
            Some(mode) => mode,
        }
    }
}

/// An entity type and its access rules, as derived from the schema.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub name: String,
    pub rules: Vec<AccessRule>,
}

impl EntitySchema {
    #[must_use]
    pub fn new(name: impl Into<String>, rules: Vec<AccessRule>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }
}

/// Runtime availability of each mechanism's credentials, queried at
/// resolve time.
pub trait CredentialProbe: Send + Sync {
    fn has_api_key(&self) -> bool;
    fn has_signing_credentials(&self) -> bool;
    fn has_oidc_token(&self) -> bool;
    fn has_user_pool_provider(&self) -> bool;
    /// Whether a user-pool session is currently authenticated. The
    /// user-pool mechanism needs both a provider and a live session.
    fn has_active_session(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_map_to_modes() {
        assert_eq!(
            AuthorizationMode::from_provider_name("apiKey"),
            Some(AuthorizationMode::ApiKey)
        );
        assert_eq!(
            AuthorizationMode::from_provider_name("iam"),
            Some(AuthorizationMode::IamSigning)
        );
        assert_eq!(
            AuthorizationMode::from_provider_name("oidc"),
            Some(AuthorizationMode::OpenIdConnect)
        );
        assert_eq!(
            AuthorizationMode::from_provider_name("userPools"),
            Some(AuthorizationMode::UserPool)
        );
        assert_eq!(AuthorizationMode::from_provider_name("saml"), None);
    }

    #[test]
    fn strategies_map_to_their_default_modes() {
        assert_eq!(
            AccessStrategy::Owner.default_mode(),
            AuthorizationMode::UserPool
        );
        assert_eq!(
            AccessStrategy::Group.default_mode(),
            AuthorizationMode::UserPool
        );
        assert_eq!(
            AccessStrategy::Private.default_mode(),
            AuthorizationMode::IamSigning
        );
        assert_eq!(
            AccessStrategy::Public.default_mode(),
            AuthorizationMode::ApiKey
        );
        assert_eq!(
            AccessStrategy::Custom.default_mode(),
            AuthorizationMode::None
        );
    }

    #[test]
    fn priority_order_is_total() {
        let mut priorities: Vec<u8> = [
            AccessStrategy::Owner,
            AccessStrategy::Group,
            AccessStrategy::Private,
            AccessStrategy::Public,
            AccessStrategy::Custom,
        ]
        .iter()
        .map(|strategy| strategy.priority())
        .collect();
        let sorted = priorities.clone();
        priorities.sort_unstable();
        assert_eq!(priorities, sorted);
        priorities.dedup();
        assert_eq!(priorities.len(), 5);
    }

    #[test]
    fn rules_without_operations_cover_everything() {
        let rule = AccessRule::new(AccessStrategy::Owner);
        for operation in Operation::ALL {
            assert!(rule.applies_to(operation));
        }

        let scoped = AccessRule::new(AccessStrategy::Owner).for_operations([Operation::Read]);
        assert!(scoped.applies_to(Operation::Read));
        assert!(!scoped.applies_to(Operation::Delete));
    }

    #[test]
    fn provider_overrides_win_over_strategy_defaults() {
        let rule =
            AccessRule::new(AccessStrategy::Public).with_provider(AuthorizationMode::OpenIdConnect);
        assert_eq!(rule.mode(), AuthorizationMode::OpenIdConnect);

        let defaulted =
            AccessRule::new(AccessStrategy::Public).with_provider(AuthorizationMode::Default);
        assert_eq!(defaulted.mode(), AuthorizationMode::ApiKey);
    }
}
