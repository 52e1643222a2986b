use crate::{UrlError, UrlResult};

/// Checks that a username can be placed in a URL path segment
///
/// Member handles are ASCII letters, digits, `_` and `-`.
pub fn validate_username(username: &str) -> UrlResult<()> {
    if username.is_empty()
        || !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(UrlError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

/// Extracts the username from a profile link such as `/alice/`
///
/// The last non-empty path segment is taken, so absolute links work too.
pub fn username_from_href(href: &str) -> Option<String> {
    let path = match href.find("://") {
        Some(idx) => {
            let rest = &href[idx + 3..];
            rest.find('/').map(|slash| &rest[slash..]).unwrap_or("")
        }
        None => href,
    };

    let candidate = path
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .last()?;

    validate_username(candidate).ok()?;
    Some(candidate.to_string())
}
