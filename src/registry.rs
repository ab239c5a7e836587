use crate::domain_utils::DomainUtils;
use std::collections::{BTreeMap, BTreeSet};

/// Read-only multi-map from project code to the recipient domains cleared for it.
///
/// Domains are stored canonicalized (lowercase), so membership is
/// case-insensitive. Project codes are matched exactly.
#[derive(Debug, Clone, Default)]
pub struct ProjectDomainRegistry {
    projects: BTreeMap<String, BTreeSet<String>>,
}

impl ProjectDomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(project, domain)` pairs. Repeated pairs collapse.
    pub fn from_pairs<I, P, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, D)>,
        P: Into<String>,
        D: AsRef<str>,
    {
        let mut registry = Self::new();
        for (project, domain) in pairs {
            registry.insert(project, domain.as_ref());
        }
        registry
    }

    pub fn from_config(projects: &BTreeMap<String, Vec<String>>) -> Self {
        Self::from_pairs(
            projects
                .iter()
                .flat_map(|(project, domains)| domains.iter().map(move |d| (project.clone(), d))),
        )
    }

    pub fn insert(&mut self, project: impl Into<String>, domain: &str) {
        self.projects
            .entry(project.into())
            .or_default()
            .insert(DomainUtils::canonicalize_domain(domain));
    }

    /// Permitted domains for `project`, or `None` when the project is unregistered.
    pub fn lookup(&self, project: &str) -> Option<&BTreeSet<String>> {
        self.projects.get(project)
    }

    /// `None` when the project places no constraint on recipients.
    pub fn permits(&self, project: &str, domain: &str) -> Option<bool> {
        self.lookup(project)
            .map(|domains| domains.contains(&DomainUtils::canonicalize_domain(domain)))
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
