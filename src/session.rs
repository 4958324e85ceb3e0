//! Per-page context handed to matchers and the filler.
//!
//! One session lives as long as one page. It owns the configuration, the
//! catalog handle, compiled custom rules, the optional semantic detector and
//! the signal cache. Navigation and DOM mutation bump the generation counter
//! and drop every cached bundle.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use scraper::Html;
use tracing::debug;

use crate::catalog::FieldCatalog;
use crate::config::AutofillConfig;
use crate::dom::{ControlId, FormDocument, SignalBundle, SignalCache};
use crate::error::Result;
use crate::matching::{
    compile_rules, CustomRule, CustomRuleSpec, MatchCandidate, MatchMode, MultiSignalScorer, SemanticDetector,
    StagedMatcher,
};
use crate::profile::Profile;

#[derive(Default)]
pub struct PageSessionBuilder {
    config: AutofillConfig,
    catalog: Option<Arc<FieldCatalog>>,
    rules: Vec<CustomRuleSpec>,
    semantic_page: Option<String>,
}

impl PageSessionBuilder {
    pub fn config(mut self, config: AutofillConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a catalog other than the built-in one.
    pub fn catalog(mut self, catalog: Arc<FieldCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn custom_rules(mut self, rules: &[CustomRuleSpec]) -> Self {
        self.rules = rules.to_vec();
        self
    }

    /// Enable the semantic stage, modelled on `page_html`.
    pub fn semantic(mut self, page_html: impl Into<String>) -> Self {
        self.semantic_page = Some(page_html.into());
        self
    }

    pub fn build(self) -> Result<PageSession> {
        self.config.validate()?;
        let catalog = self.catalog.unwrap_or_else(FieldCatalog::builtin);
        let rules = compile_rules(&self.rules);
        debug!(
            field_types = catalog.len(),
            custom_rules = rules.len(),
            semantic = self.semantic_page.is_some(),
            "page session ready"
        );
        Ok(PageSession {
            config: self.config,
            catalog,
            rules,
            semantic: self.semantic_page.map(SemanticDetector::new),
            cache: SignalCache::new(),
            generation: Cell::new(1),
        })
    }
}

pub struct PageSession {
    config: AutofillConfig,
    catalog: Arc<FieldCatalog>,
    rules: Vec<CustomRule>,
    semantic: Option<SemanticDetector>,
    cache: SignalCache,
    generation: Cell<u64>,
}

impl PageSession {
    pub fn builder() -> PageSessionBuilder {
        PageSessionBuilder::default()
    }

    pub fn config(&self) -> &AutofillConfig {
        &self.config
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub fn semantic(&self) -> Option<&SemanticDetector> {
        self.semantic.as_ref()
    }

    /// Wait for the semantic detector, if there is one.
    pub async fn ready(&self) {
        if let Some(detector) = &self.semantic {
            detector.ready().await;
        }
    }

    /// Index `html` under the current generation.
    pub fn open_document<'a>(&self, html: &'a Html) -> FormDocument<'a> {
        FormDocument::new(html, self.generation())
    }

    pub fn on_navigation(&self) {
        self.advance("navigation");
    }

    pub fn on_mutation(&self) {
        self.advance("mutation");
    }

    fn advance(&self, reason: &'static str) {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        self.cache.invalidate(next);
        debug!(generation = next, reason, "signal cache invalidated");
    }

    pub fn bundle(&self, doc: &FormDocument<'_>, id: ControlId) -> Option<Rc<SignalBundle>> {
        self.cache.bundle(doc, id)
    }

    pub fn cached_bundles(&self) -> usize {
        self.cache.len()
    }

    pub fn staged_matcher(&self) -> StagedMatcher<'_> {
        StagedMatcher::new(
            &self.catalog,
            &self.rules,
            self.semantic.as_ref(),
            self.config.enhanced_min_confidence,
        )
    }

    pub fn scorer(&self) -> MultiSignalScorer<'_> {
        MultiSignalScorer::new(&self.catalog)
    }

    fn scored(&self, bundle: &SignalBundle, profile: &Profile) -> Option<MatchCandidate> {
        self.scorer().best_candidate(bundle, profile, self.config.min_confidence)
    }

    /// Match one bundle without waiting on the semantic detector.
    pub fn match_bundle(&self, bundle: &SignalBundle, profile: &Profile, mode: MatchMode) -> Option<MatchCandidate> {
        match mode {
            MatchMode::Staged => self.staged_matcher().match_bundle(bundle, profile),
            MatchMode::Scored => self.scored(bundle, profile),
            MatchMode::StagedThenScored => self
                .staged_matcher()
                .match_bundle(bundle, profile)
                .or_else(|| self.scored(bundle, profile)),
        }
    }

    pub async fn match_bundle_async(
        &self,
        bundle: &SignalBundle,
        profile: &Profile,
        mode: MatchMode,
    ) -> Option<MatchCandidate> {
        match mode {
            MatchMode::Scored => self.scored(bundle, profile),
            MatchMode::Staged => self.staged_matcher().match_bundle_async(bundle, profile).await,
            MatchMode::StagedThenScored => match self.staged_matcher().match_bundle_async(bundle, profile).await {
                Some(hit) => Some(hit),
                None => self.scored(bundle, profile),
            },
        }
    }

    pub fn match_control(
        &self,
        doc: &FormDocument<'_>,
        id: ControlId,
        profile: &Profile,
        mode: MatchMode,
    ) -> Option<MatchCandidate> {
        let bundle = self.bundle(doc, id)?;
        self.match_bundle(&bundle, profile, mode)
    }

    pub async fn match_control_async(
        &self,
        doc: &FormDocument<'_>,
        id: ControlId,
        profile: &Profile,
        mode: MatchMode,
    ) -> Option<MatchCandidate> {
        let bundle = self.bundle(doc, id)?;
        self.match_bundle_async(&bundle, profile, mode).await
    }
}
