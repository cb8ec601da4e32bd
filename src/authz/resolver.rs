//! Priority-ordered, cached authorization mode resolution.
//!
//! The resolver walks the full rule set once at construction and caches an
//! ordered, deduplicated candidate list per (entity type, operation).
//! `resolve` is then a hash lookup plus an availability scan; rules are
//! never re-evaluated on the request path. The cache is immutable after
//! construction, so a resolver can be shared across threads freely.

use crate::authz::{
    AccessRule, AuthorizationMode, CredentialProbe, EntitySchema, Operation,
};
use crate::error::ResolverError;
use std::collections::HashMap;
use tracing::debug;

/// What `resolve` does for an (entity type, operation) pair the rule set
/// never mentioned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingRuleBehavior {
    /// Fail with [`ResolverError::Unconfigured`]; misconfiguration is loud.
    Strict,
    /// Treat the pair as having no candidates, which resolves to
    /// [`AuthorizationMode::None`].
    #[default]
    PermitNone,
}

/// Chooses the authorization mode for each request from declarative rules.
pub struct ModeResolver<P> {
    cache: HashMap<(String, Operation), Vec<AuthorizationMode>>,
    probe: P,
    missing_rules: MissingRuleBehavior,
}

impl<P: CredentialProbe> ModeResolver<P> {
    /// Builds the resolver with the default missing-rule behavior.
    #[must_use]
    pub fn new(schemas: &[EntitySchema], probe: P) -> Self {
        Self::with_behavior(schemas, probe, MissingRuleBehavior::default())
    }

    /// Builds the resolver, constructing the whole resolution cache before
    /// returning. The rule set is not retained.
    #[must_use]
    pub fn with_behavior(
        schemas: &[EntitySchema],
        probe: P,
        missing_rules: MissingRuleBehavior,
    ) -> Self {
        let mut cache = HashMap::new();
        for schema in schemas {
            for operation in Operation::ALL {
                let modes = candidate_modes(&schema.rules, operation);
                cache.insert((schema.name.clone(), operation), modes);
            }
        }
        Self {
            cache,
            probe,
            missing_rules,
        }
    }

    /// The cached candidate list for a pair, in priority order.
    #[must_use]
    pub fn candidates(
        &self,
        entity_type: &str,
        operation: Operation,
    ) -> Option<&[AuthorizationMode]> {
        self.cache
            .get(&(entity_type.to_string(), operation))
            .map(Vec::as_slice)
    }

    /// Picks the first usable candidate mode for the pair.
    ///
    /// An unusable-only candidate list yields [`AuthorizationMode::None`]
    /// rather than an error; the authorization failure surfaces on the
    /// request itself.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Unconfigured`] for an unknown pair under
    /// [`MissingRuleBehavior::Strict`].
    pub fn resolve(
        &self,
        entity_type: &str,
        operation: Operation,
    ) -> Result<AuthorizationMode, ResolverError> {
        debug!(entity_type, %operation, "resolving authorization mode");
        let candidates = match self.candidates(entity_type, operation) {
            Some(candidates) => candidates,
            None => match self.missing_rules {
                MissingRuleBehavior::Strict => {
                    return Err(ResolverError::Unconfigured {
                        entity: entity_type.to_string(),
                        operation,
                    });
                }
                MissingRuleBehavior::PermitNone => &[],
            },
        };

        Ok(candidates
            .iter()
            .copied()
            .find(|mode| self.is_usable(*mode))
            .unwrap_or(AuthorizationMode::None))
    }

    fn is_usable(&self, mode: AuthorizationMode) -> bool {
        match mode {
            AuthorizationMode::ApiKey => self.probe.has_api_key(),
            AuthorizationMode::IamSigning => self.probe.has_signing_credentials(),
            AuthorizationMode::OpenIdConnect => self.probe.has_oidc_token(),
            AuthorizationMode::UserPool => {
                self.probe.has_user_pool_provider() && self.probe.has_active_session()
            }
            AuthorizationMode::None | AuthorizationMode::Default => false,
        }
    }
}

/// Applicable rules sorted by strategy priority (stable for ties), mapped
/// to modes, deduplicated preserving first appearance.
fn candidate_modes(rules: &[AccessRule], operation: Operation) -> Vec<AuthorizationMode> {
    let mut applicable: Vec<&AccessRule> = rules
        .iter()
        .filter(|rule| rule.applies_to(operation))
        .collect();
    applicable.sort_by_key(|rule| rule.strategy.priority());

    let mut modes = Vec::new();
    for rule in applicable {
        let mode = rule.mode();
        if !modes.contains(&mode) {
            modes.push(mode);
        }
    }
    modes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::AccessStrategy;

    #[derive(Debug, Clone, Copy, Default)]
    struct StubProbe {
        api_key: bool,
        signing: bool,
        oidc: bool,
        user_pool: bool,
        session: bool,
    }

    impl CredentialProbe for StubProbe {
        fn has_api_key(&self) -> bool {
            self.api_key
        }
        fn has_signing_credentials(&self) -> bool {
            self.signing
        }
        fn has_oidc_token(&self) -> bool {
            self.oidc
        }
        fn has_user_pool_provider(&self) -> bool {
            self.user_pool
        }
        fn has_active_session(&self) -> bool {
            self.session
        }
    }

    fn post_schema() -> Vec<EntitySchema> {
        vec![EntitySchema::new(
            "Post",
            vec![
                AccessRule::new(AccessStrategy::Owner),
                AccessRule::new(AccessStrategy::Public),
            ],
        )]
    }

    #[test]
    fn owner_outranks_public_when_both_usable() {
        let probe = StubProbe {
            api_key: true,
            user_pool: true,
            session: true,
            ..StubProbe::default()
        };
        let resolver = ModeResolver::new(&post_schema(), probe);

        assert_eq!(
            resolver.resolve("Post", Operation::Read),
            Ok(AuthorizationMode::UserPool)
        );
    }

    #[test]
    fn falls_through_to_api_key_without_a_session() {
        let probe = StubProbe {
            api_key: true,
            user_pool: true,
            session: false,
            ..StubProbe::default()
        };
        let resolver = ModeResolver::new(&post_schema(), probe);

        assert_eq!(
            resolver.resolve("Post", Operation::Read),
            Ok(AuthorizationMode::ApiKey)
        );
    }

    #[test]
    fn yields_none_when_nothing_is_usable() {
        let resolver = ModeResolver::new(&post_schema(), StubProbe::default());

        assert_eq!(
            resolver.resolve("Post", Operation::Read),
            Ok(AuthorizationMode::None)
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let probe = StubProbe {
            api_key: true,
            ..StubProbe::default()
        };
        let resolver = ModeResolver::new(&post_schema(), probe);

        let first = resolver.resolve("Post", Operation::Update);
        let second = resolver.resolve("Post", Operation::Update);
        assert_eq!(first, second);
    }

    #[test]
    fn candidates_sort_by_priority_and_dedup() {
        // Supplied deliberately out of priority order.
        let schemas = vec![EntitySchema::new(
            "Note",
            vec![
                AccessRule::new(AccessStrategy::Public),
                AccessRule::new(AccessStrategy::Group),
                AccessRule::new(AccessStrategy::Owner),
            ],
        )];
        let resolver = ModeResolver::new(&schemas, StubProbe::default());

        // Owner and Group both map to the user-pool mode; one entry stays.
        assert_eq!(
            resolver.candidates("Note", Operation::Read),
            Some(&[AuthorizationMode::UserPool, AuthorizationMode::ApiKey][..])
        );
    }

    #[test]
    fn custom_strategies_sort_last() {
        let schemas = vec![EntitySchema::new(
            "Audit",
            vec![
                AccessRule::new(AccessStrategy::Custom),
                AccessRule::new(AccessStrategy::Public),
            ],
        )];
        let resolver = ModeResolver::new(&schemas, StubProbe::default());

        assert_eq!(
            resolver.candidates("Audit", Operation::Read),
            Some(&[AuthorizationMode::ApiKey, AuthorizationMode::None][..])
        );
    }

    #[test]
    fn provider_overrides_reach_the_cache() {
        let schemas = vec![EntitySchema::new(
            "Report",
            vec![AccessRule::new(AccessStrategy::Public)
                .with_provider(AuthorizationMode::OpenIdConnect)],
        )];
        let probe = StubProbe {
            oidc: true,
            ..StubProbe::default()
        };
        let resolver = ModeResolver::new(&schemas, probe);

        assert_eq!(
            resolver.resolve("Report", Operation::Read),
            Ok(AuthorizationMode::OpenIdConnect)
        );
    }

    #[test]
    fn operation_scoping_limits_rule_reach() {
        let schemas = vec![EntitySchema::new(
            "Draft",
            vec![AccessRule::new(AccessStrategy::Owner).for_operations([Operation::Read])],
        )];
        let probe = StubProbe {
            user_pool: true,
            session: true,
            ..StubProbe::default()
        };
        let resolver = ModeResolver::new(&schemas, probe);

        assert_eq!(
            resolver.resolve("Draft", Operation::Read),
            Ok(AuthorizationMode::UserPool)
        );
        // The pair exists in the cache with no candidates.
        assert_eq!(resolver.candidates("Draft", Operation::Delete), Some(&[][..]));
        assert_eq!(
            resolver.resolve("Draft", Operation::Delete),
            Ok(AuthorizationMode::None)
        );
    }

    #[test]
    fn missing_pairs_follow_the_configured_behavior() {
        let forgiving = ModeResolver::new(&post_schema(), StubProbe::default());
        assert_eq!(
            forgiving.resolve("Comment", Operation::Read),
            Ok(AuthorizationMode::None)
        );

        let strict = ModeResolver::with_behavior(
            &post_schema(),
            StubProbe::default(),
            MissingRuleBehavior::Strict,
        );
        assert_eq!(
            strict.resolve("Comment", Operation::Read),
            Err(ResolverError::Unconfigured {
                entity: "Comment".to_string(),
                operation: Operation::Read,
            })
        );
    }

    #[test]
    fn rebuilding_from_the_same_rules_is_idempotent() {
        let first = ModeResolver::new(&post_schema(), StubProbe::default());
        let second = ModeResolver::new(&post_schema(), StubProbe::default());

        for operation in Operation::ALL {
            assert_eq!(
                first.candidates("Post", operation),
                second.candidates("Post", operation)
            );
        }
    }
}
