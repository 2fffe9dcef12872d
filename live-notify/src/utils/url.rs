//! URL helpers.

/// Appends `path` to `base`, tolerating a trailing slash on the base and a
/// missing leading slash on the path.
pub fn join_endpoint(base: &str, path: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let mut url = String::with_capacity(base.len() + path.len() + 1);
    url.push_str(base);
    url.push('/');
    url.push_str(path);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_with_and_without_trailing_slash() {
        assert_eq!(
            join_endpoint("http://127.0.0.1:3000", "/send_msg"),
            "http://127.0.0.1:3000/send_msg"
        );
        assert_eq!(
            join_endpoint("http://127.0.0.1:3000/", "/send_msg"),
            "http://127.0.0.1:3000/send_msg"
        );
        assert_eq!(
            join_endpoint("http://bot.local/api", "send_msg"),
            "http://bot.local/api/send_msg"
        );
    }
}
