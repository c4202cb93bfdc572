//! Skill ingestion: frontmatter parsing, normalization into catalog
//! records, and the per-repository fetch pipeline.

pub mod frontmatter;
pub mod normalize;
pub mod pipeline;

pub use {
    frontmatter::{ParsedSkillFile, SkillFrontmatter, parse_skill_file},
    normalize::{NewSkill, PLACEHOLDER_CATEGORY, SkillAuthor, normalize_skill},
    pipeline::fetch_repo_skills,
};
