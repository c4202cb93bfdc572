//! Walk a repository's skills directory and produce normalized records.

use std::collections::HashSet;

use tracing::{debug, warn};

use skillery_github::{EntryKind, GithubClient, RepoReference, TreeEntry};

use crate::{
    frontmatter::parse_skill_file,
    normalize::{NewSkill, normalize_skill},
};

const SKILL_FILE: &str = "SKILL.md";

/// Fetch and normalize every skill under the reference's skills directory.
///
/// Skill folders are the immediate children of the skills directory; a
/// `SKILL.md` nested any deeper belongs to some skill's assets and is not a
/// skill of its own. Per-folder problems (unfetchable or incomplete
/// `SKILL.md`) skip that folder; duplicate ids keep the first occurrence and
/// log a warning. Failures on the tree listing itself, including a truncated
/// listing, propagate and fail the whole ingestion.
pub async fn fetch_repo_skills(
    client: &GithubClient,
    reference: &RepoReference,
) -> skillery_github::Result<Vec<NewSkill>> {
    let owner = &reference.owner;
    let repo = &reference.repo;

    let entries = client.fetch_tree(owner, repo).await?;

    let mut skills = Vec::new();
    let mut seen = HashSet::new();

    for entry in skill_file_entries(&entries, &reference.skills_path) {
        let raw = match client.fetch_blob(owner, repo, &entry.sha).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %entry.path, error = %e, "skipping unfetchable skill file");
                continue;
            },
        };
        let text = String::from_utf8_lossy(&raw);
        let parsed = parse_skill_file(&text);

        let Some(skill) = normalize_skill(&parsed.frontmatter, owner, repo) else {
            debug!(path = %entry.path, "skipping folder with incomplete frontmatter");
            continue;
        };

        if !seen.insert(skill.id.clone()) {
            warn!(id = %skill.id, path = %entry.path, "duplicate skill id, keeping first occurrence");
            continue;
        }
        skills.push(skill);
    }

    Ok(skills)
}

/// Select `SKILL.md` blobs exactly one directory below the skills path, in
/// listing order.
fn skill_file_entries<'a>(
    entries: &'a [TreeEntry],
    skills_path: &str,
) -> impl Iterator<Item = &'a TreeEntry> {
    let prefix = if skills_path.is_empty() {
        String::new()
    } else {
        format!("{skills_path}/")
    };
    entries.iter().filter(move |entry| {
        if entry.kind != EntryKind::Blob {
            return false;
        }
        let Some(relative) = entry.path.strip_prefix(&prefix) else {
            return false;
        };
        match relative.split_once('/') {
            Some((dir, file)) => !dir.is_empty() && file == SKILL_FILE,
            None => false,
        }
    })
}
