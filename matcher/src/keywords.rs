use watcher_core::WILDCARD;

/// Returns the keywords found in either `title` or `body`, in input order.
///
/// Comparison is case-insensitive substring containment. The wildcard
/// keyword matches every post.
pub fn find_matches<S: AsRef<str>>(keywords: &[S], title: &str, body: &str) -> Vec<String> {
    let title = title.to_lowercase();
    let body = body.to_lowercase();

    keywords
        .iter()
        .map(AsRef::as_ref)
        .filter(|keyword| {
            if *keyword == WILDCARD {
                return true;
            }
            let keyword = keyword.to_lowercase();
            title.contains(&keyword) || body.contains(&keyword)
        })
        .map(str::to_string)
        .collect()
}
