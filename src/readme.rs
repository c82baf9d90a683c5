//! Topic index maintained in the repository's root README.
//!
//! The document is a preamble followed by one `## <topic>` section per
//! topic, each listing links to the problem directories. Appending is
//! idempotent and the sort produces one canonical ordering, so folding the
//! same submission through the index any number of times yields the same
//! document.

use std::sync::OnceLock;

use regex::Regex;

/// Boilerplate used as the document base when the repository has no root
/// README yet.
pub const DEFAULT_REPO_README: &str = "A collection of LeetCode questions to ace the coding interviews! - Created using [LeetHub 2.0 for Firefox](https://github.com/maitreya2954/LeetHub-2.0-Firefox)";

fn topic_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^##\s+(\S.*?)\s*$").expect("topic heading pattern"))
}

fn heading_title(line: &str) -> Option<&str> {
    topic_heading()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn link_line(hook: &str, slug: &str) -> String {
    format!("- [{slug}](https://github.com/{hook}/tree/main/{slug})")
}

/// Ensure a section titled `topic` exists and contains a link to `slug`.
/// Inserting an already-present link is a no-op, which keeps resubmission
/// safe.
pub fn append_problem_to_readme(topic: &str, readme: &str, hook: &str, slug: &str) -> String {
    let topic = topic.trim();
    let link = link_line(hook, slug);
    let link_marker = format!("[{slug}](");

    let mut lines: Vec<String> = readme.lines().map(str::to_owned).collect();
    let section_start = lines
        .iter()
        .position(|line| heading_title(line) == Some(topic));

    let Some(start) = section_start else {
        let mut out = readme.trim_end().to_owned();
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&format!("## {topic}\n{link}\n"));
        return out;
    };

    let section_end = lines[start + 1..]
        .iter()
        .position(|line| heading_title(line).is_some())
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());

    let already_linked = lines[start + 1..section_end]
        .iter()
        .any(|line| line.contains(&link_marker));
    if already_linked {
        return readme.to_owned();
    }

    // Insert before any blank lines separating this section from the next.
    let mut insert_at = section_end;
    while insert_at > start + 1 && lines[insert_at - 1].trim().is_empty() {
        insert_at -= 1;
    }
    lines.insert(insert_at, link);
    lines.join("\n")
}

/// Rewrite the document into its canonical form: topics ordered
/// case-insensitively, links within each topic ordered likewise, preamble
/// untouched. Required because tags are folded in sequence and the result
/// must not depend on their iteration order.
pub fn sort_topics_in_readme(readme: &str) -> String {
    let lines: Vec<&str> = readme.lines().collect();
    let first_heading = lines
        .iter()
        .position(|line| heading_title(line).is_some())
        .unwrap_or(lines.len());

    let mut sections: Vec<(String, Vec<String>)> = Vec::new();
    for line in &lines[first_heading..] {
        if let Some(title) = heading_title(line) {
            sections.push((title.to_owned(), Vec::new()));
        } else if let Some((_, body)) = sections.last_mut() {
            if !line.trim().is_empty() {
                body.push(line.trim_end().to_owned());
            }
        }
    }

    sections.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));
    for (_, body) in &mut sections {
        body.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
    }

    let mut out = lines[..first_heading].join("\n").trim_end().to_owned();
    for (title, body) in &sections {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&format!("## {title}"));
        for line in body {
            out.push('\n');
            out.push_str(line);
        }
    }
    out.push('\n');
    out
}
