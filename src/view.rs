use serde::{Deserialize, Serialize};

use crate::filter::{present, JobFilter};

pub const JOBS_VIEW: &str = "Jobs";
pub const EMPLOYERS_VIEW: &str = "Employers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum View {
    Jobs,
    Employers,
}

impl View {
    /// Exact, case-sensitive match on the selector value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            JOBS_VIEW => Some(Self::Jobs),
            EMPLOYERS_VIEW => Some(Self::Employers),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jobs => JOBS_VIEW,
            Self::Employers => EMPLOYERS_VIEW,
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Self::Jobs => Self::Employers,
            Self::Employers => Self::Jobs,
        }
    }
}

/// Raw dashboard query string. Names follow the page's form fields; the
/// PascalCase aliases match the links the edit pages generate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub handler: Option<String>,
    #[serde(alias = "ActiveView")]
    pub active_view: Option<String>,
    #[serde(alias = "SearchTerm")]
    pub search_term: Option<String>,
    #[serde(alias = "LocationFilter")]
    pub location_filter: Option<String>,
    #[serde(alias = "JobTypeFilter")]
    pub job_type_filter: Option<String>,
    #[serde(alias = "EmployerNameFilter")]
    pub employer_name_filter: Option<String>,
    #[serde(alias = "EmployerSearchTerm")]
    pub employer_search_term: Option<String>,
    #[serde(alias = "EmployerId")]
    pub employer_id: Option<String>,
    #[serde(alias = "CurrentPage")]
    pub current_page: Option<String>,
    pub id: Option<String>,
}

/// Everything one dashboard request carries, built once and never mutated.
/// Job filters and the employer search term are both kept whichever view is
/// active so switching views does not lose the other view's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestContext {
    pub active_view: Option<String>,
    pub filter: JobFilter,
    pub employer_search_term: Option<String>,
    pub employer_id: Option<String>,
    pub current_page: i64,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            active_view: None,
            filter: JobFilter::default(),
            employer_search_term: None,
            employer_id: None,
            current_page: 1,
        }
    }
}

impl RequestContext {
    pub fn from_query(query: &DashboardQuery) -> Self {
        Self {
            active_view: query.active_view.clone(),
            filter: JobFilter {
                keyword: query.search_term.clone(),
                location: query.location_filter.clone(),
                job_type: query.job_type_filter.clone(),
                employer_name: query.employer_name_filter.clone(),
            },
            employer_search_term: query.employer_search_term.clone(),
            employer_id: query.employer_id.clone(),
            current_page: parse_page(query.current_page.as_deref()),
        }
    }

    /// The selector as the page sees it: the explicit value, or "Jobs".
    pub fn bound_view(&self) -> &str {
        self.active_view.as_deref().unwrap_or(JOBS_VIEW)
    }

    pub fn explicit_view(&self) -> Option<&str> {
        present(&self.active_view)
    }

    pub fn employer_search_term(&self) -> Option<&str> {
        present(&self.employer_search_term)
    }

    pub fn has_job_filters(&self) -> bool {
        !self.filter.is_empty()
    }
}

/// Non-numeric page input silently becomes page 1.
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1)
}

/// View-selection rules for the default dashboard load, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rule {
    EmployerSearchInEmployersView,
    ExplicitSelector,
    JobFilters,
    EmployerSearchTerm,
    Default,
}

impl Rule {
    pub const ORDER: [Rule; 5] = [
        Rule::EmployerSearchInEmployersView,
        Rule::ExplicitSelector,
        Rule::JobFilters,
        Rule::EmployerSearchTerm,
        Rule::Default,
    ];

    pub fn matches(&self, ctx: &RequestContext) -> bool {
        match self {
            Rule::EmployerSearchInEmployersView => {
                ctx.employer_search_term().is_some() && ctx.bound_view() == EMPLOYERS_VIEW
            }
            Rule::ExplicitSelector => ctx.explicit_view().is_some(),
            Rule::JobFilters => ctx.has_job_filters(),
            Rule::EmployerSearchTerm => ctx.employer_search_term().is_some(),
            Rule::Default => true,
        }
    }

    pub fn resolve(&self, ctx: &RequestContext) -> Resolution {
        match self {
            Rule::EmployerSearchInEmployersView => Resolution::EmployerListing {
                search_term: ctx.employer_search_term().unwrap_or_default().to_string(),
            },
            Rule::ExplicitSelector => Resolution::Select {
                active_view: ctx.bound_view().to_string(),
            },
            Rule::JobFilters | Rule::Default => Resolution::Select {
                active_view: JOBS_VIEW.to_string(),
            },
            Rule::EmployerSearchTerm => Resolution::Select {
                active_view: EMPLOYERS_VIEW.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Resolution {
    /// Hand off to the employer listing flow. The job-list flag is left to
    /// that flow and is not recomputed afterwards.
    EmployerListing { search_term: String },
    /// Render `active_view` verbatim; the job list shows only for "Jobs".
    Select { active_view: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub rule: Rule,
    pub resolution: Resolution,
}

impl Decision {
    /// `None` when the decision delegates to the employer listing flow.
    pub fn show_jobs_list(&self) -> Option<bool> {
        match &self.resolution {
            Resolution::Select { active_view } => Some(active_view == JOBS_VIEW),
            Resolution::EmployerListing { .. } => None,
        }
    }
}

/// First matching rule wins.
pub fn reconcile(ctx: &RequestContext) -> Decision {
    for rule in Rule::ORDER {
        if rule.matches(ctx) {
            return Decision {
                rule,
                resolution: rule.resolve(ctx),
            };
        }
    }
    Decision {
        rule: Rule::Default,
        resolution: Rule::Default.resolve(ctx),
    }
}
