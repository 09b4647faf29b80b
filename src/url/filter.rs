use crate::config::Settings;
use crate::url::normalize_url;

/// Runs raw extracted links through the candidate pipeline
///
/// Per link, in order:
///
/// 1. Strip the query string unless queries are allowed
/// 2. Strip the fragment unless fragments are allowed
/// 3. Join relative links onto the base URL
/// 4. Drop links that do not contain the base URL (out of scope)
/// 5. Normalize; drop links that fail to normalize
/// 6. Drop links containing any excluded keyword
/// 7. With a non-empty include list, drop links matching no include keyword
///
/// Survivors are the candidate set for enqueueing. Order is not significant.
pub fn filter_links(links: &[String], settings: &Settings) -> Vec<String> {
    links
        .iter()
        .filter_map(|raw| filter_link(raw, settings))
        .collect()
}

fn filter_link(raw: &str, settings: &Settings) -> Option<String> {
    let mut link = raw.to_string();

    if !settings.allow_query {
        if let Some(idx) = link.find('?') {
            link.truncate(idx);
        }
    }

    if !settings.allow_fragment {
        if let Some(idx) = link.find('#') {
            link.truncate(idx);
        }
    }

    // Join relative links onto the base URL. Anything shorter than two
    // characters is leftover noise from the stripping above.
    if !link.starts_with("http") && link.len() >= 2 {
        if !settings.base_url.ends_with('/') && !link.starts_with('/') {
            link.insert(0, '/');
        }
        link = format!("{}{}", settings.base_url, link);
    }

    // Scope check: the base URL must appear in the link
    if !link.contains(&settings.base_url) {
        return None;
    }

    let normalized = match normalize_url(&link) {
        Ok(n) if !n.is_empty() => n,
        _ => return None,
    };

    if settings
        .keywords_exclude
        .iter()
        .any(|kw| normalized.contains(kw))
    {
        return None;
    }

    if !settings.keywords_include.is_empty()
        && !settings
            .keywords_include
            .iter()
            .any(|kw| normalized.contains(kw))
    {
        return None;
    }

    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base: &str) -> Settings {
        Settings {
            base_url: base.to_string(),
            ..Settings::default()
        }
    }

    fn run_one(raw: &str, settings: &Settings) -> Option<String> {
        filter_links(&[raw.to_string()], settings).into_iter().next()
    }

    #[test]
    fn test_relative_link_joined_to_base() {
        let s = settings("http://example.com");
        assert_eq!(
            run_one("/about", &s),
            Some("http://example.com/about".to_string())
        );
    }

    #[test]
    fn test_relative_link_without_leading_slash() {
        let s = settings("http://example.com");
        assert_eq!(
            run_one("about", &s),
            Some("http://example.com/about".to_string())
        );
    }

    #[test]
    fn test_no_double_slash_when_base_ends_with_slash() {
        let s = settings("http://example.com/");
        assert_eq!(
            run_one("about", &s),
            Some("http://example.com/about".to_string())
        );
    }

    #[test]
    fn test_short_relative_link_survives() {
        let s = settings("http://example.com");
        assert_eq!(run_one("/a", &s), Some("http://example.com/a".to_string()));
    }

    #[test]
    fn test_out_of_scope_rejected() {
        let s = settings("http://example.com");
        assert_eq!(run_one("http://other.com/x", &s), None);
    }

    #[test]
    fn test_query_and_fragment_stripped_by_default() {
        let s = settings("http://example.com");
        assert_eq!(
            run_one("http://example.com/x?y=1#z", &s),
            Some("http://example.com/x".to_string())
        );
    }

    #[test]
    fn test_query_kept_when_allowed() {
        let mut s = settings("http://example.com");
        s.allow_query = true;
        assert_eq!(
            run_one("http://example.com/x?y=1", &s),
            Some("http://example.com/x?y=1".to_string())
        );
    }

    #[test]
    fn test_fragment_kept_when_allowed() {
        let mut s = settings("http://example.com");
        s.allow_fragment = true;
        assert_eq!(
            run_one("http://example.com/x#z", &s),
            Some("http://example.com/x#z".to_string())
        );
    }

    #[test]
    fn test_exclude_keyword_rejects() {
        let mut s = settings("http://example.com");
        s.keywords_exclude = vec!["/admin".to_string()];
        assert_eq!(run_one("http://example.com/admin/page", &s), None);
        assert_eq!(
            run_one("http://example.com/public", &s),
            Some("http://example.com/public".to_string())
        );
    }

    #[test]
    fn test_include_keywords_required_when_present() {
        let mut s = settings("http://example.com");
        s.keywords_include = vec!["/blog".to_string()];
        assert_eq!(run_one("http://example.com/about", &s), None);
        assert_eq!(
            run_one("http://example.com/blog/post", &s),
            Some("http://example.com/blog/post".to_string())
        );
    }

    #[test]
    fn test_query_stripped_before_scope_check() {
        // an out-of-scope URL hidden in a query param must not leak through
        let s = settings("http://example.com");
        assert_eq!(
            run_one("http://example.com/x?next=http://other.com", &s),
            Some("http://example.com/x".to_string())
        );
    }

    #[test]
    fn test_empty_and_noise_links_dropped() {
        let s = settings("http://example.com");
        assert_eq!(run_one("", &s), None);
        assert_eq!(run_one("#", &s), None);
        assert_eq!(run_one("?", &s), None);
    }

    #[test]
    fn test_candidate_set_order_and_contents() {
        let s = settings("http://example.com");
        let links = vec![
            "/a".to_string(),
            "/b?x=1".to_string(),
            "http://other.com/c".to_string(),
        ];
        let candidates = filter_links(&links, &s);
        assert_eq!(
            candidates,
            vec![
                "http://example.com/a".to_string(),
                "http://example.com/b".to_string(),
            ]
        );
    }
}
