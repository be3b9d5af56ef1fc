use serde::{Deserialize, Serialize};

use crate::models::{Employer, JobListing};

/// Optional, AND-combined narrowing conditions on a job collection.
/// A criterion counts as present when it is `Some` and not the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilter {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub employer_name: Option<String>,
}

impl JobFilter {
    pub fn keyword(&self) -> Option<&str> {
        present(&self.keyword)
    }

    pub fn location(&self) -> Option<&str> {
        present(&self.location)
    }

    pub fn job_type(&self) -> Option<&str> {
        present(&self.job_type)
    }

    pub fn employer_name(&self) -> Option<&str> {
        present(&self.employer_name)
    }

    pub fn is_empty(&self) -> bool {
        self.keyword().is_none()
            && self.location().is_none()
            && self.job_type().is_none()
            && self.employer_name().is_none()
    }

    pub fn matches(&self, job: &JobListing) -> bool {
        if let Some(keyword) = self.keyword() {
            let hit = contains_ci(&job.title, keyword)
                || contains_ci(&job.employer_name, keyword)
                || contains_ci(&job.description, keyword);
            if !hit {
                return false;
            }
        }
        if let Some(location) = self.location() {
            if !equals_ci(&job.location, location) {
                return false;
            }
        }
        if let Some(job_type) = self.job_type() {
            if !equals_ci(&job.job_type, job_type) {
                return false;
            }
        }
        if let Some(employer) = self.employer_name() {
            if !contains_ci(&job.employer_name, employer) {
                return false;
            }
        }
        true
    }

    /// Keeps the jobs matching every present criterion, in input order.
    pub fn apply(&self, jobs: Vec<JobListing>) -> Vec<JobListing> {
        if self.is_empty() {
            return jobs;
        }
        jobs.into_iter().filter(|job| self.matches(job)).collect()
    }
}

pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn contains_ci(field: &Option<String>, needle: &str) -> bool {
    match field {
        Some(haystack) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => false,
    }
}

fn equals_ci(field: &Option<String>, expected: &str) -> bool {
    match field {
        Some(value) => value.to_lowercase() == expected.to_lowercase(),
        None => false,
    }
}

/// Employers whose name contains `search_term` (case-insensitive).
/// An absent or empty term returns every employer.
pub fn filter_employers<'a>(
    employers: &'a [Employer],
    search_term: Option<&str>,
) -> Vec<&'a Employer> {
    match search_term.filter(|t| !t.is_empty()) {
        Some(term) => employers
            .iter()
            .filter(|e| contains_ci(&e.name, term))
            .collect(),
        None => employers.iter().collect(),
    }
}

/// De-duplicated, ordinally sorted projection of non-empty names.
pub fn distinct_sorted<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut out: Vec<String> = names
        .into_iter()
        .flatten()
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();
    out.sort();
    out.dedup();
    out
}
