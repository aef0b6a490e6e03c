//! `Link` header pagination.

use reqwest::header::{HeaderMap, LINK};
use reqwest::Url;

/// Extracts the `page` query parameter of the `rel="next"` link, if any.
///
/// GitHub omits the `next` relation on the final page, which is how the
/// janitor knows to stop.
pub fn next_page(headers: &HeaderMap) -> Option<u32> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments.any(|param| {
            param
                .trim()
                .strip_prefix("rel=")
                .map(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
                .unwrap_or(false)
        });
        if !is_next {
            return None;
        }
        let url = Url::parse(target.strip_prefix('<')?.strip_suffix('>')?).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn headers(link: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_str(link).unwrap());
        headers
    }

    #[test]
    fn finds_next_page_among_relations() {
        let link = r#"<https://api.github.com/repositories/1/issues?per_page=100&page=3>; rel="next", <https://api.github.com/repositories/1/issues?per_page=100&page=9>; rel="last""#;
        assert_eq!(next_page(&headers(link)), Some(3));
    }

    #[test]
    fn next_relation_need_not_come_first() {
        let link = r#"<https://api.github.com/search/issues?q=x&page=1>; rel="prev", <https://api.github.com/search/issues?q=x&page=3>; rel="next""#;
        assert_eq!(next_page(&headers(link)), Some(3));
    }

    #[test]
    fn last_page_has_no_next() {
        let link = r#"<https://api.github.com/repositories/1/issues?page=1>; rel="first", <https://api.github.com/repositories/1/issues?page=8>; rel="prev""#;
        assert_eq!(next_page(&headers(link)), None);
    }

    #[test]
    fn missing_header_means_single_page() {
        assert_eq!(next_page(&HeaderMap::new()), None);
    }
}
