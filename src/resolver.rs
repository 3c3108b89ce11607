//! # Page Resolver
//!
//! Maps a link title to the page it refers to. Rules, in priority order:
//!
//! 1. the page's title, compared case-insensitively;
//! 2. the page's path, exactly;
//! 3. the page's path with its extension stripped, exactly.
//!
//! A match under a higher-priority rule always beats one under a lower rule. When several pages
//! match under the same rule the shortest path wins, then the lexicographically smallest, so the
//! result never depends on enumeration order.

use crate::{page::Page, paths::strip_extension};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRule {
    Title,
    Path,
    PathWithoutExtension,
}

/// The best rule under which `page` matches `link`, if any.
pub fn match_rule(page: &Page, link: &str, link_lower: &str) -> Option<MatchRule> {
    if page
        .title
        .as_deref()
        .is_some_and(|title| title.to_lowercase() == link_lower)
    {
        Some(MatchRule::Title)
    } else if page.path == link {
        Some(MatchRule::Path)
    } else if strip_extension(&page.path) == link {
        Some(MatchRule::PathWithoutExtension)
    } else {
        None
    }
}

fn tie_break(a: &Page, b: &Page) -> Ordering {
    a.path
        .len()
        .cmp(&b.path.len())
        .then_with(|| a.path.cmp(&b.path))
}

/// Resolve `link` against `pages`. `None` means unresolved, which is a normal outcome.
pub fn resolve<'p, I>(pages: I, link: &str) -> Option<&'p Page>
where
    I: IntoIterator<Item = &'p Page>,
{
    let link_lower = link.to_lowercase();
    pages
        .into_iter()
        .filter_map(|page| match_rule(page, link, &link_lower).map(|rule| (rule, page)))
        .min_by(|(rule_a, page_a), (rule_b, page_b)| {
            rule_a.cmp(rule_b).then_with(|| tie_break(page_a, page_b))
        })
        .map(|(_, page)| page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn page(path: &str, title: Option<&str>) -> Page {
        let mut page = Page::new(PathBuf::from("/wiki").join(path), path.to_string());
        page.title = title.map(str::to_string);
        page
    }

    #[test]
    fn resolves_by_title_path_and_stem() {
        let pages = vec![page("my-page.md", Some("My Page")), page("other.md", None)];
        for link in ["My Page", "my page", "MY PAGE", "my-page.md", "my-page"] {
            let resolved = resolve(&pages, link).map(|p| p.path.as_str());
            assert_eq!(resolved, Some("my-page.md"), "link {link:?}");
        }
    }

    #[test]
    fn path_matching_is_case_sensitive() {
        let pages = vec![page("my-page.md", None)];
        assert!(resolve(&pages, "My-Page").is_none());
        assert!(resolve(&pages, "MY-PAGE.md").is_none());
    }

    #[test]
    fn unresolved_is_none() {
        let pages = vec![page("a.md", Some("A"))];
        assert!(resolve(&pages, "Nothing").is_none());
        assert!(resolve(Vec::<&Page>::new(), "A").is_none());
    }

    #[test]
    fn nested_paths_resolve_with_and_without_extension() {
        let pages = vec![page("dir/sub/c.md", None)];
        assert!(resolve(&pages, "dir/sub/c.md").is_some());
        assert!(resolve(&pages, "dir/sub/c").is_some());
        assert!(resolve(&pages, "c").is_none());
    }

    #[test]
    fn title_rule_beats_path_rule() {
        let pages = vec![page("notes.md", None), page("z/other.md", Some("notes"))];
        assert_eq!(
            resolve(&pages, "notes").map(|p| p.path.as_str()),
            Some("z/other.md")
        );
    }

    #[test]
    fn ambiguous_titles_prefer_shortest_then_lexicographic_path() {
        let pages = vec![
            page("deep/dir/dup.md", Some("Dup")),
            page("b.md", Some("Dup")),
            page("a.md", Some("Dup")),
        ];
        assert_eq!(resolve(&pages, "dup").map(|p| p.path.as_str()), Some("a.md"));

        let reversed: Vec<Page> = pages.into_iter().rev().collect();
        assert_eq!(resolve(&reversed, "dup").map(|p| p.path.as_str()), Some("a.md"));
    }
}
