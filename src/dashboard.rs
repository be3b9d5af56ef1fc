use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::db::ListingStore;
use crate::filter::{self, present, JobFilter};
use crate::models::{Employer, JobListing};
use crate::pagination::{paginate, Page, JOBS_PAGE_SIZE};
use crate::view::{
    self, DashboardQuery, RequestContext, Resolution, Rule, EMPLOYERS_VIEW, JOBS_VIEW,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    LoadDefault,
    ShowJobs,
    ShowJobDetails { id: Option<String> },
    ShowEmployers {
        employer_id: Option<String>,
        employer_search_term: Option<String>,
    },
    GetEmployerDetails { employer_id: Option<String> },
}

impl Operation {
    /// Picks the operation named by the `handler` query parameter.
    /// Unknown or missing handlers fall back to the default load.
    pub fn from_query(query: &DashboardQuery) -> Self {
        let handler = query.handler.as_deref().unwrap_or("").to_ascii_lowercase();
        match handler.as_str() {
            "showjobs" => Self::ShowJobs,
            "showjobdetails" => Self::ShowJobDetails {
                id: query.id.clone(),
            },
            "showemployers" => Self::ShowEmployers {
                employer_id: query.employer_id.clone(),
                employer_search_term: query.employer_search_term.clone(),
            },
            "employerdetailsjson" | "employerdetails" => Self::GetEmployerDetails {
                employer_id: query.employer_id.clone(),
            },
            _ => Self::LoadDefault,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub selected: bool,
}

/// Everything a dashboard render needs.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardModel {
    pub active_view: String,
    pub show_jobs_list: bool,
    pub search_term: Option<String>,
    pub location_filter: Option<String>,
    pub job_type_filter: Option<String>,
    pub employer_name_filter: Option<String>,
    pub employer_search_term: Option<String>,
    pub current_page: i64,
    pub selected_job: Option<JobListing>,
    pub selected_employer: Option<Employer>,
    pub distinct_employer_names: Vec<String>,
    pub location_options: Vec<SelectOption>,
    pub employer_filter_options: Vec<SelectOption>,
    /// Paged job list for the Jobs view; absent when the list is hidden.
    pub jobs: Option<Page<JobListing>>,
    /// Which view rule decided a default load.
    pub resolved_by: Option<Rule>,
}

impl DashboardModel {
    fn new(ctx: &RequestContext) -> Self {
        Self {
            active_view: ctx.bound_view().to_string(),
            show_jobs_list: false,
            search_term: ctx.filter.keyword.clone(),
            location_filter: ctx.filter.location.clone(),
            job_type_filter: ctx.filter.job_type.clone(),
            employer_name_filter: ctx.filter.employer_name.clone(),
            employer_search_term: ctx.employer_search_term.clone(),
            current_page: ctx.current_page,
            selected_job: None,
            selected_employer: None,
            distinct_employer_names: Vec::new(),
            location_options: Vec::new(),
            employer_filter_options: Vec::new(),
            jobs: None,
            resolved_by: None,
        }
    }

    pub fn job_filter(&self) -> JobFilter {
        JobFilter {
            keyword: self.search_term.clone(),
            location: self.location_filter.clone(),
            job_type: self.job_type_filter.clone(),
            employer_name: self.employer_name_filter.clone(),
        }
    }
}

/// Structured payload with an HTTP-style status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonReply {
    pub status: u16,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Page(Box<DashboardModel>),
    Json(JsonReply),
}

/// Single entry point for every dashboard GET.
pub fn dispatch<S: ListingStore + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    op: Operation,
) -> Response {
    match op {
        Operation::LoadDefault => Response::Page(Box::new(load_default(store, ctx))),
        Operation::ShowJobs => Response::Page(Box::new(show_jobs(store, ctx))),
        Operation::ShowJobDetails { id } => {
            Response::Page(Box::new(show_job_details(store, ctx, id.as_deref())))
        }
        Operation::ShowEmployers {
            employer_id,
            employer_search_term,
        } => {
            let mut model = DashboardModel::new(ctx);
            show_employers(
                store,
                &mut model,
                employer_id.as_deref(),
                employer_search_term.as_deref(),
            );
            Response::Page(Box::new(model))
        }
        Operation::GetEmployerDetails { employer_id } => {
            Response::Json(employer_details(store, employer_id.as_deref()))
        }
    }
}

fn load_default<S: ListingStore + ?Sized>(store: &S, ctx: &RequestContext) -> DashboardModel {
    let mut model = DashboardModel::new(ctx);
    populate_options(store, &mut model);

    let decision = view::reconcile(ctx);
    let rule = decision.rule;
    model.resolved_by = Some(rule);

    match &decision.resolution {
        Resolution::EmployerListing { search_term } => {
            info!(search_term = %search_term, "default load handing off to employer listing");
            // Returns before the job-list flag is recomputed below.
            show_employers(store, &mut model, None, Some(search_term));
            return model;
        }
        Resolution::Select { active_view } => {
            model.active_view = active_view.clone();
        }
    }

    model.show_jobs_list = decision.show_jobs_list().unwrap_or(false);
    if model.show_jobs_list {
        model.jobs = Some(job_page(store, &model.job_filter(), model.current_page));
    }

    info!(
        active_view = %model.active_view,
        search = ?ctx.filter.keyword,
        location = ?ctx.filter.location,
        job_type = ?ctx.filter.job_type,
        employer_name = ?ctx.filter.employer_name,
        employer_search_term = ?ctx.employer_search_term,
        page = ctx.current_page,
        show_jobs = model.show_jobs_list,
        rule = ?rule,
        "dashboard default load"
    );
    model
}

fn show_jobs<S: ListingStore + ?Sized>(store: &S, ctx: &RequestContext) -> DashboardModel {
    let mut model = DashboardModel::new(ctx);
    populate_options(store, &mut model);
    info!(
        search = ?ctx.filter.keyword,
        location = ?ctx.filter.location,
        job_type = ?ctx.filter.job_type,
        employer_name = ?ctx.filter.employer_name,
        page = ctx.current_page,
        "dashboard show jobs"
    );
    model.active_view = JOBS_VIEW.to_string();
    model.show_jobs_list = true;
    model.jobs = Some(job_page(store, &ctx.filter, ctx.current_page));
    model
}

/// Selecting a job never fails the request: a blank id or a miss leaves
/// nothing selected and the job list in place.
fn show_job_details<S: ListingStore + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    id: Option<&str>,
) -> DashboardModel {
    let mut model = show_jobs(store, ctx);
    info!(id = ?id, "dashboard show job details");

    model.selected_job = match id.filter(|i| !i.is_empty()) {
        None => {
            warn!("show job details called with null or empty ID");
            None
        }
        Some(id) => match store.get_job_by_id(id) {
            Ok(Some(job)) => Some(job),
            Ok(None) => {
                warn!(id, "job not found for show job details");
                None
            }
            Err(e) => {
                error!(id, error = %e, "job lookup failed");
                None
            }
        },
    };
    model
}

/// Outcome of the employer listing flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployerSelection {
    pub distinct_names: Vec<String>,
    pub selected: Option<Employer>,
}

/// Filters employers by `search_term` and picks the current one: the
/// explicit id when it names a listed employer, else the first name
/// alphabetically, else nothing.
pub fn select_employers(
    employers: &[Employer],
    search_term: Option<&str>,
    employer_id: Option<&str>,
) -> EmployerSelection {
    let filtered = filter::filter_employers(employers, search_term);
    let distinct_names = filter::distinct_sorted(filtered.iter().map(|e| e.name.as_deref()));

    let wanted = employer_id
        .filter(|id| !id.is_empty())
        .filter(|id| distinct_names.iter().any(|n| n == id))
        .or_else(|| distinct_names.first().map(String::as_str));

    let selected = wanted.and_then(|name| {
        employers
            .iter()
            .find(|e| e.name.as_deref() == Some(name))
            .cloned()
    });

    EmployerSelection {
        distinct_names,
        selected,
    }
}

fn show_employers<S: ListingStore + ?Sized>(
    store: &S,
    model: &mut DashboardModel,
    employer_id: Option<&str>,
    employer_search_term: Option<&str>,
) {
    info!(
        employer_id = ?employer_id,
        employer_search_term = ?employer_search_term,
        "dashboard show employers"
    );
    model.show_jobs_list = false;
    model.active_view = EMPLOYERS_VIEW.to_string();
    model.jobs = None;

    if let Some(term) = employer_search_term.filter(|t| !t.is_empty()) {
        model.employer_search_term = Some(term.to_string());
    }

    let employers = store.list_employers().unwrap_or_else(|e| {
        error!(error = %e, "failed to load employers");
        Vec::new()
    });

    let selection = select_employers(&employers, present(&model.employer_search_term), employer_id);
    info!(
        total = employers.len(),
        matched = selection.distinct_names.len(),
        selected = ?selection.selected.as_ref().map(Employer::name),
        "employer listing ready"
    );
    model.distinct_employer_names = selection.distinct_names;
    model.selected_employer = selection.selected;
}

pub fn employer_details<S: ListingStore + ?Sized>(
    store: &S,
    employer_id: Option<&str>,
) -> JsonReply {
    let Some(employer_id) = employer_id.filter(|id| !id.is_empty()) else {
        warn!("employer details requested with null or empty id");
        return JsonReply {
            status: 400,
            body: json!({ "error": "Employer ID cannot be empty." }),
        };
    };

    let employers = match store.list_employers() {
        Ok(employers) => employers,
        Err(e) => {
            error!(employer_id, error = %e, "failed to load employers for details");
            return JsonReply {
                status: 500,
                body: json!({ "error": "Failed to load employers." }),
            };
        }
    };

    match employers.into_iter().find(|e| e.name.as_deref() == Some(employer_id)) {
        Some(employer) => {
            info!(employer_id, "returning employer details");
            JsonReply {
                status: 200,
                body: json!(employer),
            }
        }
        None => {
            warn!(employer_id, "employer not found for details");
            JsonReply {
                status: 404,
                body: json!({
                    "error": format!("Employer with name '{}' not found.", employer_id)
                }),
            }
        }
    }
}

/// The job listing for the Jobs view at the requested page.
pub fn job_page<S: ListingStore + ?Sized>(
    store: &S,
    filter: &JobFilter,
    requested_page: i64,
) -> Page<JobListing> {
    let jobs = store.list_jobs(filter).unwrap_or_else(|e| {
        error!(error = %e, "failed to load jobs");
        Vec::new()
    });
    paginate(jobs, requested_page, JOBS_PAGE_SIZE)
}

fn populate_options<S: ListingStore + ?Sized>(store: &S, model: &mut DashboardModel) {
    let all = store.list_jobs(&JobFilter::default()).unwrap_or_else(|e| {
        error!(error = %e, "failed to load jobs for filter options");
        Vec::new()
    });

    let locations = filter::distinct_sorted(all.iter().map(|j| j.location.as_deref()));
    model.location_options = options("All Locations", locations, model.location_filter.as_deref());

    let employers = filter::distinct_sorted(all.iter().map(|j| j.employer_name.as_deref()));
    model.employer_filter_options =
        options("All Employers", employers, model.employer_name_filter.as_deref());
}

fn options(all_label: &str, values: Vec<String>, current: Option<&str>) -> Vec<SelectOption> {
    let current = current.unwrap_or("");
    let mut out = Vec::with_capacity(values.len() + 1);
    out.push(SelectOption {
        label: all_label.to_string(),
        value: String::new(),
        selected: current.is_empty(),
    });
    for value in values {
        out.push(SelectOption {
            selected: value == current,
            label: value.clone(),
            value,
        });
    }
    out
}
