//! Inverted-index recipe recommendation over a [`RecipeCorpus`].

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::corpus::{CorpusRecord, RecipeCorpus};
use crate::normalize::NormalizedToken;

/// Filters and limits for [`RecommendationIndex::recommend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendOptions {
    pub top_k: usize,
    pub allow_missing: bool,
    pub max_missing: usize,
    pub min_overlap: usize,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            allow_missing: true,
            max_missing: 3,
            min_overlap: 1,
        }
    }
}

/// A ranked match.
#[derive(Debug, Clone)]
pub struct Recommendation<'a> {
    pub record: &'a CorpusRecord,
    pub overlap: BTreeSet<NormalizedToken>,
    pub missing: BTreeSet<NormalizedToken>,
    pub score: f64,
}

/// Score rewarding both absolute coverage and match density.
pub fn score(overlap: usize, missing: usize, record_tokens: usize) -> f64 {
    10.0 * overlap as f64 - missing as f64 + 200.0 * (overlap as f64 / record_tokens.max(1) as f64)
}

/// token -> indices of corpus records that use it. Built once, never mutated.
#[derive(Debug)]
pub struct RecommendationIndex {
    corpus: RecipeCorpus,
    postings: HashMap<NormalizedToken, BTreeSet<usize>>,
}

impl RecommendationIndex {
    pub fn new(corpus: RecipeCorpus) -> Self {
        let mut postings: HashMap<NormalizedToken, BTreeSet<usize>> = HashMap::new();
        for (idx, record) in corpus.records().iter().enumerate() {
            for token in &record.tokens {
                postings.entry(token.clone()).or_default().insert(idx);
            }
        }

        tracing::debug!(
            recipes = corpus.len(),
            tokens = postings.len(),
            "Built recommendation index"
        );

        Self { corpus, postings }
    }

    pub fn corpus(&self) -> &RecipeCorpus {
        &self.corpus
    }

    /// True if the token is an indexed ingredient or a declared alias.
    pub fn knows(&self, token: &NormalizedToken) -> bool {
        self.postings.contains_key(token) || self.corpus.aliases().is_alias(token)
    }

    /// Rank corpus recipes against the user's ingredient tokens.
    ///
    /// Aliases are expanded first (specific implies general). An empty token
    /// set yields no recommendations.
    pub fn recommend(
        &self,
        user_tokens: &BTreeSet<NormalizedToken>,
        options: RecommendOptions,
    ) -> Vec<Recommendation<'_>> {
        if user_tokens.is_empty() {
            return Vec::new();
        }

        let user_tokens = self.corpus.aliases().expand(user_tokens);

        let candidates: BTreeSet<usize> = user_tokens
            .iter()
            .filter_map(|t| self.postings.get(t))
            .flatten()
            .copied()
            .collect();

        let mut ranked: Vec<Recommendation<'_>> = candidates
            .into_iter()
            .filter_map(|idx| self.corpus.get(idx))
            .filter_map(|record| {
                let overlap: BTreeSet<NormalizedToken> =
                    record.tokens.intersection(&user_tokens).cloned().collect();
                let missing: BTreeSet<NormalizedToken> =
                    record.tokens.difference(&user_tokens).cloned().collect();

                if overlap.len() < options.min_overlap
                    || (!options.allow_missing && !missing.is_empty())
                    || missing.len() > options.max_missing
                {
                    return None;
                }

                let score = score(overlap.len(), missing.len(), record.tokens.len());
                Some(Recommendation {
                    record,
                    overlap,
                    missing,
                    score,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.missing.len().cmp(&b.missing.len()))
                .then_with(|| a.record.name().cmp(b.record.name()))
        });
        ranked.truncate(options.top_k);
        ranked
    }
}
