//! Applicant tracking system detection from a page URL.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Platform {
    Greenhouse,
    Lever,
    Workday,
    Ashby,
    SmartRecruiters,
    Icims,
    Jobvite,
    BambooHr,
    LinkedIn,
    Indeed,
    #[default]
    Unknown,
}

/// Host suffix -> platform. Subdomains (`acme.wd5.myworkdayjobs.com`) match.
const HOSTS: &[(&str, Platform)] = &[
    ("greenhouse.io", Platform::Greenhouse),
    ("lever.co", Platform::Lever),
    ("myworkdayjobs.com", Platform::Workday),
    ("myworkday.com", Platform::Workday),
    ("workday.com", Platform::Workday),
    ("ashbyhq.com", Platform::Ashby),
    ("smartrecruiters.com", Platform::SmartRecruiters),
    ("icims.com", Platform::Icims),
    ("jobvite.com", Platform::Jobvite),
    ("bamboohr.com", Platform::BambooHr),
    ("linkedin.com", Platform::LinkedIn),
    ("indeed.com", Platform::Indeed),
];

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greenhouse => "greenhouse",
            Self::Lever => "lever",
            Self::Workday => "workday",
            Self::Ashby => "ashby",
            Self::SmartRecruiters => "smartRecruiters",
            Self::Icims => "icims",
            Self::Jobvite => "jobvite",
            Self::BambooHr => "bambooHr",
            Self::LinkedIn => "linkedIn",
            Self::Indeed => "indeed",
            Self::Unknown => "unknown",
        }
    }

    pub fn detect(page_url: &str) -> Self {
        let Ok(parsed) = Url::parse(page_url) else {
            return Self::Unknown;
        };
        let Some(host) = parsed.host_str().map(str::to_ascii_lowercase) else {
            return Self::Unknown;
        };
        HOSTS
            .iter()
            .find(|(suffix, _)| host == *suffix || host.ends_with(&format!(".{suffix}")))
            .map(|(_, platform)| *platform)
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
