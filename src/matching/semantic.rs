//! Semantic detection for the staged matcher's enhanced stage.
//!
//! Reads question-style labels ("What is your given name?", "Will you now or
//! in the future require sponsorship?") that attribute patterns miss. The
//! page model behind it (JSON-LD types, main-content keywords) is built once
//! per page; until then the detector answers nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::dom::SignalBundle;
use crate::extraction::{extract_readability, find_job_postings};

struct SemanticEntry {
    field: &'static str,
    phrases: &'static [&'static str],
    context: &'static [&'static str],
}

const ENTRIES: &[SemanticEntry] = &[
    SemanticEntry {
        field: "firstName",
        phrases: &["first name", "given name", "forename", "christian name"],
        context: &["personal", "name"],
    },
    SemanticEntry {
        field: "lastName",
        phrases: &["last name", "surname", "family name"],
        context: &["personal", "name"],
    },
    SemanticEntry {
        field: "fullName",
        phrases: &["full name", "legal name", "name as it appears", "your name"],
        context: &["personal"],
    },
    SemanticEntry {
        field: "email",
        phrases: &["email address", "e mail address", "electronic mail", "reach you by email"],
        context: &["contact"],
    },
    SemanticEntry {
        field: "phone",
        phrases: &["phone number", "mobile number", "contact number", "cell phone", "telephone number"],
        context: &["contact"],
    },
    SemanticEntry {
        field: "linkedin",
        phrases: &["linkedin profile", "linkedin url", "linkedin"],
        context: &["links", "profile"],
    },
    SemanticEntry {
        field: "website",
        phrases: &["personal website", "portfolio url", "portfolio link", "link to your portfolio"],
        context: &["links", "profile"],
    },
    SemanticEntry {
        field: "city",
        phrases: &["city of residence", "which city", "where are you located", "current location", "where do you live"],
        context: &["address", "location"],
    },
    SemanticEntry {
        field: "currentCompany",
        phrases: &["current employer", "current company", "where do you currently work", "most recent employer"],
        context: &["experience", "employment"],
    },
    SemanticEntry {
        field: "currentTitle",
        phrases: &["current title", "current job title", "current role", "most recent title"],
        context: &["experience", "employment"],
    },
    SemanticEntry {
        field: "yearsExperience",
        phrases: &["years of experience", "how many years", "years of professional experience"],
        context: &["experience"],
    },
    SemanticEntry {
        field: "currentSalary",
        phrases: &["current salary", "current compensation", "current ctc", "current base salary"],
        context: &["compensation"],
    },
    SemanticEntry {
        field: "expectedSalary",
        phrases: &[
            "salary expectations",
            "salary expectation",
            "desired salary",
            "expected salary",
            "expected compensation",
            "compensation expectations",
        ],
        context: &["compensation"],
    },
    SemanticEntry {
        field: "noticePeriod",
        phrases: &["notice period", "how much notice"],
        context: &["availability"],
    },
    SemanticEntry {
        field: "startDate",
        phrases: &["when can you start", "earliest start date", "available to start", "start date"],
        context: &["availability"],
    },
    SemanticEntry {
        field: "workAuthorization",
        phrases: &["legally authorized to work", "legally authorised to work", "eligible to work", "right to work", "work permit"],
        context: &["eligibility", "authorization"],
    },
    SemanticEntry {
        field: "requiresSponsorship",
        phrases: &["require sponsorship", "require visa sponsorship", "need sponsorship", "visa sponsorship"],
        context: &["eligibility", "authorization"],
    },
    SemanticEntry {
        field: "willingToRelocate",
        phrases: &["willing to relocate", "open to relocation", "open to relocating"],
        context: &["location"],
    },
    SemanticEntry {
        field: "coverLetter",
        phrases: &["cover letter", "why do you want to work", "why are you interested"],
        context: &["application"],
    },
];

const APPLICATION_WORDS: &[&str] = &["apply", "application", "resume", "candidate", "applicant"];

const LABEL_CONFIDENCE: f64 = 0.8;
const SECONDARY_CONFIDENCE: f64 = 0.65;
const CONTEXT_BOOST: f64 = 0.05;
const PAGE_BOOST: f64 = 0.05;
const MAX_CONFIDENCE: f64 = 0.95;

static CONFIRM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)confirm|verify|repeat|retype|re.?enter").expect("static regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticHit {
    pub field_type: &'static str,
    pub confidence: f64,
}

/// Page-level facts the detector leans on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemanticModel {
    pub job_posting: bool,
    pub application_page: bool,
}

fn padded_words(text: &str) -> String {
    format!(" {} ", NON_WORD.replace_all(&text.to_lowercase(), " ").trim())
}

impl SemanticModel {
    pub fn from_page(html: &str) -> Self {
        let document = Html::parse_document(html);
        let job_posting = !find_job_postings(&document).is_empty();

        let readable = extract_readability(html, "http://localhost/");
        let text = format!("{} {}", readable.title, readable.text_content).to_lowercase();
        let application_page = APPLICATION_WORDS.iter().any(|w| text.contains(w));

        Self {
            job_posting,
            application_page,
        }
    }

    pub fn detect(&self, bundle: &SignalBundle) -> Option<SemanticHit> {
        if CONFIRM.is_match(&bundle.combined()) {
            return None;
        }

        let sources = [
            (padded_words(&bundle.label), LABEL_CONFIDENCE),
            (padded_words(&bundle.aria_label), SECONDARY_CONFIDENCE),
            (padded_words(&bundle.placeholder), SECONDARY_CONFIDENCE),
        ];

        let mut best: Option<(&SemanticEntry, f64, usize)> = None;
        for entry in ENTRIES {
            for phrase in entry.phrases {
                let needle = format!(" {phrase} ");
                for (text, base) in &sources {
                    if !text.contains(&needle) {
                        continue;
                    }
                    let better = match best {
                        None => true,
                        Some((_, b, len)) => *base > b || (*base == b && phrase.len() > len),
                    };
                    if better {
                        best = Some((entry, *base, phrase.len()));
                    }
                }
            }
        }

        let (entry, base, _) = best?;
        let mut confidence = base;
        if entry.context.iter().any(|c| bundle.context.contains(c)) {
            confidence += CONTEXT_BOOST;
        }
        if self.job_posting || self.application_page {
            confidence += PAGE_BOOST;
        }
        Some(SemanticHit {
            field_type: entry.field,
            confidence: confidence.min(MAX_CONFIDENCE),
        })
    }
}

/// Two-phase capability: uninitialized until the page model is built, then
/// ready for the rest of the page session.
#[derive(Debug)]
pub struct SemanticDetector {
    page_html: String,
    model: OnceCell<SemanticModel>,
}

impl SemanticDetector {
    pub fn new(page_html: impl Into<String>) -> Self {
        Self {
            page_html: page_html.into(),
            model: OnceCell::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.model.initialized()
    }

    /// Build the page model if needed and wait for it.
    pub async fn ready(&self) -> &SemanticModel {
        self.model
            .get_or_init(|| async {
                tokio::task::yield_now().await;
                let model = SemanticModel::from_page(&self.page_html);
                debug!(
                    job_posting = model.job_posting,
                    application_page = model.application_page,
                    "semantic model ready"
                );
                model
            })
            .await
    }

    /// Non-blocking detection; `None` while uninitialized.
    pub fn detect_if_ready(&self, bundle: &SignalBundle) -> Option<SemanticHit> {
        self.model.get()?.detect(bundle)
    }

    pub async fn detect(&self, bundle: &SignalBundle) -> Option<SemanticHit> {
        self.ready().await.detect(bundle)
    }
}
