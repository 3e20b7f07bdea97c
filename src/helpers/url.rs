//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for("/blog/", "/styles.css") // -> "/blog/styles.css"
/// ```
pub fn url_for(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Link to a post page by uid
pub fn post_path(root: &str, uid: &str) -> String {
    url_for(root, &format!("post/{}", encode_segment(uid)))
}

/// Percent-encode a single path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for() {
        assert_eq!(url_for("/", "styles.css"), "/styles.css");
        assert_eq!(url_for("/blog/", "/styles.css"), "/blog/styles.css");
        assert_eq!(url_for("/blog", ""), "/blog/");
    }

    #[test]
    fn test_post_path_encodes_uid() {
        assert_eq!(post_path("/", "como-utilizar-hooks"), "/post/como-utilizar-hooks");
        assert_eq!(post_path("/", "a b/c"), "/post/a%20b%2Fc");
    }
}
