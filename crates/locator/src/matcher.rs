// ABOUTME: Fuzzy locator matching: finds every node whose ancestor chain resembles a LocatorPath.
// ABOUTME: Anchor search, id/class prefilter, depth reconciliation and trust-scored acceptance.

//! Path matching.
//!
//! For each element carrying the anchor's tag, the matcher:
//!
//! 1. drops it when neither its id nor its class resembles the anchor's
//!    (similarity at or below `prefilter_threshold` for both),
//! 2. scores the candidate and its ancestors against successive path
//!    segments, at most `path.len()` levels and never the document root,
//! 3. credits `importance(p)` at full trust for every position the document
//!    is too shallow to reach, and
//! 4. accepts the candidate when `total / normalization >= accept_threshold`.
//!
//! Matching is infallible; an empty path or a document without candidates
//! simply yields no results.

use serde::Serialize;
use tracing::{debug, trace};

use crate::dom::{HtmlTree, Node, NodeIndex};
use crate::path::{LocatorPath, PathSegment};
use crate::similarity::{NormalizedLevenshtein, Similarity};
use crate::trust::TrustModel;

/// An accepted node and its trust.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    pub node: NodeIndex,
    pub trust: f64,
}

/// Applies locator paths to documents under one trust model.
#[derive(Debug, Clone)]
pub struct PathMatcher<'m, S = NormalizedLevenshtein> {
    model: &'m TrustModel,
    similarity: S,
}

impl<'m> PathMatcher<'m> {
    /// A matcher using normalized Levenshtein similarity.
    pub fn new(model: &'m TrustModel) -> Self {
        Self {
            model,
            similarity: NormalizedLevenshtein,
        }
    }
}

impl<'m, S: Similarity> PathMatcher<'m, S> {
    pub fn with_similarity(model: &'m TrustModel, similarity: S) -> Self {
        Self { model, similarity }
    }

    pub fn model(&self) -> &TrustModel {
        self.model
    }

    /// Every node of `tree` accepted for `path`, in document order.
    pub fn find_all(&self, tree: &HtmlTree, path: &LocatorPath) -> Vec<MatchResult> {
        let Some(anchor) = path.anchor() else {
            return Vec::new();
        };

        let candidates = tree.find_by_tag(&anchor.tag);
        let found = candidates.len();
        let accepted: Vec<MatchResult> = candidates
            .into_iter()
            .filter_map(|node| {
                let trust = self.score(tree, path, node)?;
                if self.model.accepts(trust) {
                    Some(MatchResult { node, trust })
                } else {
                    None
                }
            })
            .collect();

        debug!(
            path = %path,
            candidates = found,
            accepted = accepted.len(),
            "matched locator path"
        );
        accepted
    }

    /// Trust of `candidate` for `path`, or `None` when the path is empty, the
    /// node is unknown, or the candidate fails the prefilter. The anchor tag
    /// is not checked here.
    pub fn score(&self, tree: &HtmlTree, path: &LocatorPath, candidate: NodeIndex) -> Option<f64> {
        let anchor = path.anchor()?;
        let node = tree.node(candidate)?;
        if !self.passes_prefilter(node, anchor) {
            trace!(node = candidate.0, "prefilter rejected candidate");
            return None;
        }

        let segments = path.segments();
        let expected = segments.len();
        let depth = node.depth();

        // Positions the document cannot reach are assumed to match perfectly.
        let mut total: f64 = (depth.min(expected)..expected)
            .map(|p| self.model.missing_level_credit(p))
            .sum();

        for (p, (_, level)) in tree.chain(candidate).take(expected).enumerate() {
            total += self.level_score(level, &segments[p], p);
        }

        let trust = self.model.trust(total);
        trace!(node = candidate.0, depth, total, trust, "scored candidate");
        Some(trust)
    }

    fn passes_prefilter(&self, node: &Node, anchor: &PathSegment) -> bool {
        let threshold = self.model.prefilter_threshold();
        self.similarity.similarity(node.id(), &anchor.id_pattern) > threshold
            || self
                .similarity
                .similarity(node.class_value(), &anchor.class_pattern)
                > threshold
    }

    fn level_score(&self, node: &Node, segment: &PathSegment, p: usize) -> f64 {
        if self.model.rampup(p) == 0.0 {
            return 0.0;
        }
        let id_sim = self.similarity.similarity(node.id(), &segment.id_pattern);
        let class_sim = self
            .similarity
            .similarity(node.class_value(), &segment.class_pattern);
        self.model.level_score(p, id_sim, class_sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::TrustParams;

    fn model(rampup_span: f64, accept_threshold: f64) -> TrustModel {
        TrustModel::new(TrustParams {
            depth_decay: 1.0,
            id_weight: 0.6,
            class_weight: 0.4,
            rampup_span,
            prefilter_threshold: 0.7,
            accept_threshold,
        })
        .unwrap()
    }

    const PAGE: &str = r#"
        <html><body>
          <ul id="results" class="list">
            <li class="item"><a id="p1" class="product-link" href="/p/1">One</a></li>
            <li class="item"><a id="p2" class="product-link" href="/p/2">Two</a></li>
          </ul>
          <footer><a id="share" class="social" href="/share">Share</a></footer>
        </body></html>
    "#;

    #[test]
    fn empty_path_yields_nothing() {
        let m = model(1.0, 0.0);
        let tree = HtmlTree::parse_document(PAGE);
        let matcher = PathMatcher::new(&m);
        assert!(matcher.find_all(&tree, &LocatorPath::default()).is_empty());
        assert!(matcher
            .find_all(&tree, &LocatorPath::parse("<href>"))
            .is_empty());
    }

    #[test]
    fn prefilter_drops_unrelated_anchors() {
        let m = model(1.0, 0.0);
        let tree = HtmlTree::parse_document(PAGE);
        let matcher = PathMatcher::new(&m);
        let path = LocatorPath::parse("<href><a>p1,product-link<li>,item<ul>results,list");

        let results = matcher.find_all(&tree, &path);
        let hrefs: Vec<_> = results
            .iter()
            .filter_map(|r| tree.resolve(r.node, path.target()))
            .collect();
        assert_eq!(hrefs, vec!["/p/1", "/p/2"]);

        let social = tree.find_by_tag("a")[2];
        assert_eq!(matcher.score(&tree, &path, social), None);
    }

    #[test]
    fn prefilter_passes_on_id_alone() {
        let m = model(1.0, 0.0);
        let tree = HtmlTree::parse_fragment(r#"<span id="price" class="x9f2">9</span>"#);
        let matcher = PathMatcher::new(&m);
        let path = LocatorPath::parse("<span>price,totally-different");
        assert!(matcher.score(&tree, &path, tree.find_by_tag("span")[0]).is_some());
    }

    #[test]
    fn prefilter_discards_similarity_at_threshold() {
        let m = model(1.0, 0.0);
        let tree = HtmlTree::parse_document(PAGE);
        let path = LocatorPath::parse("<a>p1,product-link");
        let a = tree.find_by_tag("a")[0];

        let at = |_: &str, _: &str| 0.7;
        assert_eq!(PathMatcher::with_similarity(&m, at).score(&tree, &path, a), None);

        let above = |_: &str, _: &str| 0.7 + 1e-9;
        assert!(PathMatcher::with_similarity(&m, above)
            .score(&tree, &path, a)
            .is_some());
    }

    #[test]
    fn anchor_level_never_contributes() {
        let m = model(1.0, 0.0);
        let tree = HtmlTree::parse_document(PAGE);
        let matcher = PathMatcher::new(&m);
        let a = tree.find_by_tag("a")[0];
        let path = LocatorPath::parse("<a>,product-link");
        assert_eq!(matcher.score(&tree, &path, a), Some(0.0));
    }

    #[test]
    fn deep_chains_are_truncated_to_path_length() {
        let m = model(1.0, 0.0);
        let tree = HtmlTree::parse_document(PAGE);
        let matcher = PathMatcher::new(&m);
        let a = tree.find_by_tag("a")[0];

        // a sits at depth 5: only a, li and ul are scored
        let path = LocatorPath::parse("<a>,product-link<li>,item<ul>results,list");
        let expected = (0.25 + 1.0 / 9.0) / m.normalization();
        let trust = matcher.score(&tree, &path, a).unwrap();
        assert!((trust - expected).abs() < 1e-12, "trust {}", trust);
        assert!((trust - m.ceiling(3)).abs() < 1e-12);
    }

    #[test]
    fn shallow_documents_receive_full_credit() {
        let m = model(1.0, 0.0);
        let mut b = HtmlTree::builder();
        let li = b.push(NodeIndex::ROOT, "li", None, Some("item"));
        let a = b.push(li, "a", None, Some("product-link"));
        let tree = b.build();
        let matcher = PathMatcher::new(&m);

        // depth 2 against 4 segments: positions 2 and 3 credited
        let path = LocatorPath::parse("<a>,product-link<li>,item<ul>results,list<div>,");
        let total = 0.25 + m.importance(2) + m.importance(3);
        let trust = matcher.score(&tree, &path, a).unwrap();
        assert!((trust - total / m.normalization()).abs() < 1e-12);
    }

    #[test]
    fn accept_threshold_is_inclusive() {
        let tree = HtmlTree::parse_document(PAGE);
        let path = LocatorPath::parse("<a>,product-link<li>,item<ul>results,list");
        let probe = model(1.0, 0.0);
        let trust = PathMatcher::new(&probe)
            .score(&tree, &path, tree.find_by_tag("a")[0])
            .unwrap();

        let at = model(1.0, trust);
        assert_eq!(PathMatcher::new(&at).find_all(&tree, &path).len(), 2);

        let above = model(1.0, (trust + 0.01).min(1.0));
        assert!(PathMatcher::new(&above).find_all(&tree, &path).is_empty());
    }

    #[test]
    fn custom_similarity_is_used() {
        let m = model(1.0, 0.0);
        let tree = HtmlTree::parse_document(PAGE);
        let never = |_: &str, _: &str| 0.0;
        let matcher = PathMatcher::with_similarity(&m, never);
        let path = LocatorPath::parse("<a>,product-link");
        assert!(matcher.find_all(&tree, &path).is_empty());
    }
}
