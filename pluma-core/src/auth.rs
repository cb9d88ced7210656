use crate::error::PlumaError;
use crate::plugin::{Caller, Plugin};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Enumerates the domains a caller administers.
#[async_trait]
pub trait DomainAuthority: Send + Sync {
    async fn authorized_domain_ids(&self, caller: &Caller) -> Result<HashSet<i64>, PlumaError>;
}

/// Domain authority backed by a fixed user → domains table.
///
/// Users listed in `super_admins` administer every domain that appears
/// anywhere in the table.
#[derive(Debug, Clone, Default)]
pub struct StaticDomainAuthority {
    domain_admins: HashMap<String, HashSet<i64>>,
    super_admins: HashSet<String>,
}

impl StaticDomainAuthority {
    pub fn new(
        domain_admins: HashMap<String, Vec<i64>>,
        super_admins: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            domain_admins: domain_admins
                .into_iter()
                .map(|(user, ids)| (user, ids.into_iter().collect()))
                .collect(),
            super_admins: super_admins.into_iter().collect(),
        }
    }

    fn all_domains(&self) -> HashSet<i64> {
        self.domain_admins.values().flatten().copied().collect()
    }
}

#[async_trait]
impl DomainAuthority for StaticDomainAuthority {
    async fn authorized_domain_ids(&self, caller: &Caller) -> Result<HashSet<i64>, PlumaError> {
        if self.super_admins.contains(&caller.name) {
            return Ok(self.all_domains());
        }
        Ok(self
            .domain_admins
            .get(&caller.name)
            .cloned()
            .unwrap_or_default())
    }
}

/// Whether `plugin` is visible to a caller administering `authorized`.
///
/// Unscoped and all-domain plugins are always visible; otherwise at least one
/// scoped domain must be authorized.
pub fn is_visible(plugin: &Plugin, authorized: &HashSet<i64>) -> bool {
    plugin.domain_list.is_empty()
        || plugin.contains_all_domain
        || plugin.domain_list.iter().any(|id| authorized.contains(id))
}

/// Drop the plugins a caller may not see.
pub fn filter_authorized(plugins: Vec<Plugin>, authorized: &HashSet<i64>) -> Vec<Plugin> {
    plugins
        .into_iter()
        .filter(|plugin| is_visible(plugin, authorized))
        .collect()
}

/// Resolve the caller's domains once, then filter.
pub async fn authorize(
    plugins: Vec<Plugin>,
    authority: &dyn DomainAuthority,
    caller: &Caller,
) -> Result<Vec<Plugin>, PlumaError> {
    let authorized = authority.authorized_domain_ids(caller).await?;
    let before = plugins.len();
    let visible = filter_authorized(plugins, &authorized);
    tracing::debug!(
        caller = %caller.name,
        candidates = before,
        visible = visible.len(),
        "Applied domain authorization"
    );
    Ok(visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::ParseMode;
    use chrono::Utc;

    fn plugin(domains: Vec<i64>, all: bool) -> Plugin {
        let now = Utc::now();
        Plugin {
            id: 1,
            name: None,
            plugin_type: "DSL".into(),
            pattern: "p".into(),
            parse_mode: ParseMode::Rule,
            parse_mode_config: None,
            domain_list: domains,
            contains_all_domain: all,
            config: None,
            comment: None,
            created_by: "a".into(),
            created_at: now,
            updated_by: "a".into(),
            updated_at: now,
        }
    }

    fn ids(v: &[i64]) -> HashSet<i64> {
        v.iter().copied().collect()
    }

    #[test]
    fn scoped_plugin_outside_authorized_set_is_excluded() {
        assert!(!is_visible(&plugin(vec![5], false), &ids(&[1, 2, 3])));
    }

    #[test]
    fn all_domain_flag_overrides_scope() {
        assert!(is_visible(&plugin(vec![5], true), &ids(&[1, 2, 3])));
    }

    #[test]
    fn unscoped_plugin_is_visible_to_everyone() {
        assert!(is_visible(&plugin(vec![], false), &ids(&[])));
    }

    #[test]
    fn any_intersection_is_enough() {
        assert!(is_visible(&plugin(vec![9, 2], false), &ids(&[2])));
    }

    #[test]
    fn empty_authorized_set_fails_closed() {
        assert!(!is_visible(&plugin(vec![1], false), &ids(&[])));
    }

    #[test]
    fn filter_keeps_order_of_visible_plugins() {
        let mut a = plugin(vec![1], false);
        a.id = 10;
        let mut b = plugin(vec![5], false);
        b.id = 11;
        let mut c = plugin(vec![], false);
        c.id = 12;
        let visible = filter_authorized(vec![a, b, c], &ids(&[1]));
        let got: Vec<i64> = visible.iter().map(|p| p.id).collect();
        assert_eq!(got, vec![10, 12]);
    }

    #[tokio::test]
    async fn static_authority_resolves_user_domains() {
        let authority = StaticDomainAuthority::new(
            HashMap::from([
                ("alice".to_string(), vec![1, 2]),
                ("bob".to_string(), vec![3]),
            ]),
            vec!["root".to_string()],
        );
        let alice = authority
            .authorized_domain_ids(&Caller::new("alice"))
            .await
            .unwrap();
        assert_eq!(alice, ids(&[1, 2]));

        let root = authority
            .authorized_domain_ids(&Caller::new("root"))
            .await
            .unwrap();
        assert_eq!(root, ids(&[1, 2, 3]));

        let nobody = authority
            .authorized_domain_ids(&Caller::new("mallory"))
            .await
            .unwrap();
        assert!(nobody.is_empty());
    }
}
