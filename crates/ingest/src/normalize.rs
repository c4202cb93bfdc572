//! Turn one folder's frontmatter plus repository context into a canonical
//! skill record.

use url::Url;

use crate::frontmatter::SkillFrontmatter;

/// Reserved placeholder for skills the frontmatter did not categorize.
pub const PLACEHOLDER_CATEGORY: &str = "Uncategorized";

const GITHUB_HOSTS: [&str; 2] = ["github.com", "www.github.com"];

/// Author attribution derived from metadata with owner fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillAuthor {
    pub name: String,
    pub url: String,
    pub avatar_url: String,
    /// Case-folded lookup key; an index key, never shown to users.
    pub slug: Option<String>,
}

/// A normalized skill ready for the sync transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSkill {
    /// `owner/repo/name`, exact and case-preserving.
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: Option<SkillAuthor>,
}

/// Normalize one skill folder. Returns `None` when `name` or `description`
/// is absent: an incomplete folder is skipped, not an error.
pub fn normalize_skill(
    frontmatter: &SkillFrontmatter,
    owner: &str,
    repo: &str,
) -> Option<NewSkill> {
    let name = frontmatter.name.as_deref().filter(|s| !s.is_empty())?;
    let description = frontmatter
        .description
        .as_deref()
        .filter(|s| !s.is_empty())?;

    Some(NewSkill {
        id: format!("{owner}/{repo}/{name}"),
        name: name.to_string(),
        description: description.to_string(),
        category: frontmatter
            .get("category")
            .filter(|c| !c.is_empty())
            .unwrap_or(PLACEHOLDER_CATEGORY)
            .to_string(),
        tags: parse_tags(frontmatter.get("tags")),
        author: build_author(frontmatter.get("author"), owner),
    })
}

/// Split a raw tags value on commas and whitespace, dropping empties.
/// Exact duplicates within one skill are kept as authored.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Author derivation ───────────────────────────────────────────────────────

/// Where the author identity came from, in precedence order.
enum AuthorSource<'a> {
    /// Metadata value that looks like a bare handle (`[\w-]+`).
    Handle(&'a str),
    /// Metadata value that is a full URL.
    ProfileUrl(&'a str),
    /// Free-form metadata value (a display name).
    Display(&'a str),
    /// No usable metadata; attribute to the repository owner.
    Owner,
}

fn classify_author(metadata_author: Option<&str>) -> AuthorSource<'_> {
    match metadata_author.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) if is_bare_handle(value) => AuthorSource::Handle(value),
        Some(value) if value.starts_with("http") => AuthorSource::ProfileUrl(value),
        Some(value) => AuthorSource::Display(value),
        None => AuthorSource::Owner,
    }
}

/// Build the author record. Each source maps to a (name, handle, url) row;
/// the avatar always derives from the handle.
pub fn build_author(metadata_author: Option<&str>, owner: &str) -> Option<SkillAuthor> {
    if metadata_author.is_none() && owner.is_empty() {
        return None;
    }

    let (name, handle, url) = match classify_author(metadata_author) {
        AuthorSource::Handle(h) => (h.to_string(), h, format!("https://github.com/{h}")),
        AuthorSource::ProfileUrl(u) => (u.to_string(), owner, u.to_string()),
        AuthorSource::Display(d) => (d.to_string(), owner, format!("https://github.com/{owner}")),
        AuthorSource::Owner => (
            owner.to_string(),
            owner,
            format!("https://github.com/{owner}"),
        ),
    };

    let slug = github_username_from_url(&url).or_else(|| slugify_author_name(&name));

    Some(SkillAuthor {
        name,
        url,
        avatar_url: format!("https://avatars.githubusercontent.com/{handle}"),
        slug,
    })
}

fn is_bare_handle(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Extract and case-fold a GitHub username from a profile URL, if the URL
/// points at github.com.
pub fn github_username_from_url(url: &str) -> Option<String> {
    let with_scheme = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    let parsed = Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if !GITHUB_HOSTS.contains(&host.as_str()) {
        return None;
    }
    parsed
        .path()
        .split('/')
        .find(|s| !s.is_empty())
        .map(|username| username.trim().to_lowercase())
        .filter(|username| !username.is_empty())
}

/// Case-folded, ASCII-hyphenated normalization of a display name.
pub fn slugify_author_name(name: &str) -> Option<String> {
    let lower = name.trim().to_lowercase();
    let mut slug = String::with_capacity(lower.len());
    let mut pending_dash = false;
    for c in lower.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() { None } else { Some(slug) }
}
