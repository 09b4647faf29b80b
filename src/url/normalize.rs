use crate::UrlError;
use url::Url;

/// Normalizes a URL into the canonical form used as a frontier key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http/https
/// 3. Lowercase scheme and host, strip default ports (done by the parser)
/// 4. Resolve dot segments, collapse duplicate slashes
/// 5. Remove the trailing slash (except for the root path)
/// 6. Sort query parameters alphabetically; drop an empty query
///
/// Fragments are kept: whether they survive at all is decided earlier by the
/// link filter, and stripping them here would make that policy unreachable.
///
/// Normalizing is idempotent: `normalize_url(normalize_url(u)) == normalize_url(u)`.
///
/// # Examples
///
/// ```
/// use quarry::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.COM/a/../b/").unwrap();
/// assert_eq!(url, "http://example.com/b");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            let query = params
                .iter()
                .map(|(k, v)| {
                    if v.is_empty() {
                        k.clone()
                    } else {
                        format!("{}={}", k, v)
                    }
                })
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }
    }

    Ok(url.to_string())
}

/// Normalizes a path: collapses duplicate slashes, resolves leftover dot
/// segments, and removes the trailing slash unless the path is the root
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}
