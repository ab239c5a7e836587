/// Minimal mailbox and domain utilities
pub struct DomainUtils;

impl DomainUtils {
    /// Split a mailbox into `(user, domain)`.
    ///
    /// Requires exactly one `@` with non-empty parts on both sides.
    pub fn split_address(address: &str) -> Option<(&str, &str)> {
        let address = address.trim();
        let (user, domain) = address.split_once('@')?;
        if user.is_empty() || domain.is_empty() || domain.contains('@') {
            return None;
        }
        Some((user, domain))
    }

    /// Exact membership test on canonical forms
    pub fn matches_domain_list(domain: &str, domain_list: &[String]) -> bool {
        let domain = Self::canonicalize_domain(domain);
        domain_list
            .iter()
            .any(|pattern| Self::canonicalize_domain(pattern) == domain)
    }

    /// Canonical form used for registry keys and comparisons
    pub fn canonicalize_domain(domain: &str) -> String {
        domain.trim().trim_end_matches('.').to_lowercase()
    }
}
