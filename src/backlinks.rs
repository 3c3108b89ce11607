//! # Backlink Index
//!
//! Backlinks are stored on the page being referenced. Each [`BackLink`] records the location of
//! the reference in the referencing document, so everything a document contributes can be found
//! (and dropped) by its locator.
//!
//! Updates are scoped to one source document at a time:
//!
//! - [`compute_links_for`] tokenizes a page and resolves every occurrence into a
//!   [`LinkContribution`] destined for the target page.
//! - [`reconcile`] drops every entry whose location lies in the source document and appends the
//!   freshly computed contributions.
//! - [`remove_links_from`] drops every entry whose location lies in a deleted document.
//!
//! [`merge`] only ever appends (or refreshes the preview of an entry at an identical location),
//! which lets contributions computed concurrently during a scan be folded in one at a time.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use crate::{
    links::{find_links, line_at, TextRange},
    page::{BackLink, Location, Page, PageMap},
    resolver::resolve,
};

/// A backlink computed from a source page, addressed to the page it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContribution {
    pub target: String,
    pub back_link: BackLink,
}

/// Resolve every link occurrence in `source` against `pages`.
///
/// Pages without loaded contents contribute nothing. Unresolved occurrences are skipped.
pub fn compute_links_for<'p, I>(source: &Page, pages: I) -> Vec<LinkContribution>
where
    I: IntoIterator<Item = &'p Page> + Clone,
{
    let Some(contents) = source.contents.as_deref() else {
        return Vec::new();
    };
    find_links(contents)
        .filter_map(|occurrence| {
            let target = resolve(pages.clone(), &occurrence.title)?;
            Some(LinkContribution {
                target: target.path.clone(),
                back_link: BackLink {
                    location: Location {
                        locator: source.locator.clone(),
                        range: TextRange::from_offsets(contents, occurrence.content_span()),
                    },
                    line_preview: line_at(contents, occurrence.content_start).to_string(),
                },
            })
        })
        .collect()
}

/// Fold contributions into their targets' backlinks. Returns the paths of pages whose backlinks
/// were touched.
pub fn merge<I>(pages: &mut PageMap, contributions: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = LinkContribution>,
{
    let mut touched = BTreeSet::new();
    for LinkContribution { target, back_link } in contributions {
        let Some(page) = pages.get_mut(&target) else {
            tracing::debug!("Dropping backlink to untracked page {target}");
            continue;
        };
        match page
            .back_links
            .iter_mut()
            .find(|existing| existing.location == back_link.location)
        {
            Some(existing) => existing.line_preview = back_link.line_preview,
            None => page.back_links.push(back_link),
        }
        touched.insert(target);
    }
    touched
}

/// Drop every backlink located in the document at `locator`. Returns the paths of pages that
/// lost entries.
pub fn remove_links_from(pages: &mut PageMap, locator: &Path) -> BTreeSet<String> {
    let mut touched = BTreeSet::new();
    for (path, page) in pages.iter_mut() {
        let before = page.back_links.len();
        page.back_links.retain(|link| !link.is_from(locator));
        if page.back_links.len() != before {
            touched.insert(path.clone());
        }
    }
    touched
}

/// Recompute the backlinks contributed by the page at `source_path`. Returns the paths of pages
/// whose backlinks differ from before.
pub fn reconcile(pages: &mut PageMap, source_path: &str) -> BTreeSet<String> {
    let Some(source) = pages.get(source_path) else {
        tracing::debug!("Reconcile requested for untracked page {source_path}");
        return BTreeSet::new();
    };
    let locator = source.locator.clone();
    let contributions = compute_links_for(source, pages.values());

    let previous: BTreeMap<String, Vec<BackLink>> = pages
        .iter()
        .filter(|(_, page)| page.back_links.iter().any(|link| link.is_from(&locator)))
        .map(|(path, page)| (path.clone(), page.back_links.clone()))
        .collect();

    let mut affected = remove_links_from(pages, &locator);
    affected.extend(merge(pages, contributions));

    affected
        .into_iter()
        .filter(|path| {
            let now = pages.get(path).map(|page| page.back_links.as_slice());
            let before = previous.get(path).map(Vec::as_slice).unwrap_or_default();
            now != Some(before)
        })
        .collect()
}
