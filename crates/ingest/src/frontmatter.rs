//! Line-oriented frontmatter extraction for SKILL.md files.
//!
//! This is a deliberately narrow subset of YAML: zero-indentation
//! `key: value` scalars for `name` and `description`, one nested
//! `metadata:` mapping of flat string pairs, and single/double quote
//! stripping. Lists, anchors and multi-line scalars are out of scope.

const DELIMITER: &str = "---";

/// Flat metadata parsed from the head of a skill's description file.
/// A document with no leading delimiter yields the default (empty) value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillFrontmatter {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Nested `metadata:` pairs in document order. Later duplicates of a
    /// key replace earlier ones.
    pub metadata: Vec<(String, String)>,
}

impl SkillFrontmatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn set(&mut self, key: &str, value: String) {
        if let Some(slot) = self.metadata.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.metadata.push((key.to_string(), value));
        }
    }
}

/// Frontmatter plus everything after the closing delimiter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSkillFile {
    pub frontmatter: SkillFrontmatter,
    pub body: String,
}

/// Split a document on `---` delimiters and parse the block between them.
///
/// If the first line is not a delimiter the whole input is body. A missing
/// closing delimiter swallows the rest of the document as frontmatter.
pub fn parse_skill_file(content: &str) -> ParsedSkillFile {
    let mut lines = content.lines();
    match lines.next() {
        Some(first) if first.trim() == DELIMITER => {},
        _ => {
            return ParsedSkillFile {
                frontmatter: SkillFrontmatter::default(),
                body: content.to_string(),
            };
        },
    }

    let mut block = Vec::new();
    for line in lines.by_ref() {
        if line.trim() == DELIMITER {
            break;
        }
        block.push(line);
    }
    let body = lines.collect::<Vec<_>>().join("\n");

    ParsedSkillFile {
        frontmatter: parse_block(&block),
        body,
    }
}

/// Parser position inside the frontmatter block.
enum BlockState {
    TopLevel,
    InMetadata,
}

fn parse_block(lines: &[&str]) -> SkillFrontmatter {
    let mut frontmatter = SkillFrontmatter::default();
    let mut state = BlockState::TopLevel;

    for raw in lines {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        let indent = raw.len() - raw.trim_start().len();

        if indent == 0 {
            state = if key == "metadata" && value.is_empty() {
                BlockState::InMetadata
            } else {
                BlockState::TopLevel
            };
            match key {
                "name" => frontmatter.name = Some(strip_quotes(value).to_string()),
                "description" => {
                    frontmatter.description = Some(strip_quotes(value).to_string());
                },
                _ => {},
            }
        } else if matches!(state, BlockState::InMetadata) {
            frontmatter.set(key, strip_quotes(value).to_string());
        }
    }

    frontmatter
}

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
