/// Converts a name into a URL slug: lower case ASCII letters, digits, underscores and single hyphens.
///
/// Characters other than letters, digits, underscores, whitespace and hyphens are dropped; runs of whitespace and
/// hyphens collapse into a single hyphen. Leading and trailing hyphens and underscores are stripped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }
    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}
