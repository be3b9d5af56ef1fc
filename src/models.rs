use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Employer {
    #[serde(rename = "employer_name")]
    pub name: Option<String>,
    pub company_vision: Option<String>,
    pub tech_stack: Option<String>,
}

impl Employer {
    pub fn new(name: &str, company_vision: &str, tech_stack: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            company_vision: Some(company_vision.to_string()),
            tech_stack: Some(tech_stack.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub id: Option<String>,
    pub title: Option<String>,
    pub employer_name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub apply_url: Option<String>,
    #[serde(default = "Utc::now")]
    pub date_posted: DateTime<Utc>,
    pub job_type: Option<String>, // "Full-time", "Part-time", "Internship", "Contract"
}

impl Default for JobListing {
    fn default() -> Self {
        Self {
            id: None,
            title: None,
            employer_name: None,
            description: None,
            location: None,
            apply_url: None,
            date_posted: DateTime::<Utc>::UNIX_EPOCH,
            job_type: None,
        }
    }
}

impl JobListing {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

/// Fields a user submits on the job create/edit forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobInput {
    pub id: Option<String>,
    pub title: Option<String>,
    pub employer_name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub apply_url: Option<String>,
    pub job_type: Option<String>,
}

impl JobInput {
    pub fn into_listing(self) -> JobListing {
        JobListing {
            id: self.id,
            title: self.title,
            employer_name: self.employer_name,
            description: self.description,
            location: self.location,
            apply_url: self.apply_url,
            date_posted: DateTime::<Utc>::UNIX_EPOCH,
            job_type: self.job_type,
        }
    }
}

impl From<&JobListing> for JobInput {
    fn from(job: &JobListing) -> Self {
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            employer_name: job.employer_name.clone(),
            description: job.description.clone(),
            location: job.location.clone(),
            apply_url: job.apply_url.clone(),
            job_type: job.job_type.clone(),
        }
    }
}

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn job(title: &str, employer: &str, location: &str, job_type: &str) -> JobListing {
        JobListing {
            id: Some(format!("{}-{}", employer.to_lowercase(), title.len())),
            title: Some(title.to_string()),
            employer_name: Some(employer.to_string()),
            description: Some(format!("{} role at {}", title, employer)),
            location: Some(location.to_string()),
            apply_url: Some("https://example.com/apply".to_string()),
            date_posted: Utc::now(),
            job_type: Some(job_type.to_string()),
        }
    }

    pub fn sample_jobs() -> Vec<JobListing> {
        vec![
            job("Software Developer", "TechCorp", "Seattle", "Full-time"),
            job("Data Analyst", "DataCo", "Portland", "Part-time"),
        ]
    }
}
