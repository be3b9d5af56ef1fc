use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{error, info, warn};
use url::form_urlencoded;

use crate::db::ListingStore;
use crate::error::StoreError;
use crate::filter::present;
use crate::models::{Employer, JobInput, JobListing};
use crate::view::{parse_page, EMPLOYERS_VIEW};

pub const DASHBOARD_PATH: &str = "/dashboard";

static APPLY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(ht|f)tps?://[0-9a-z]([-.\w]*[0-9a-z])*(:(0-9)*)*(/?)([a-z0-9\-.?,'/\\+&%$#_]*)?$",
    )
    .expect("apply url pattern")
});

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[a-z\s.-]+,\s[a-z]{2}|Remote)$").expect("location pattern")
});

const INVALID_URL: &str = "The Apply URL format is invalid.";
const INVALID_LOCATION: &str =
    "Location must be in 'City, ST' format (e.g., Seattle, WA) or 'Remote'.";

/// Job list state carried through the job forms and back to the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListState {
    #[serde(alias = "SearchTerm")]
    pub search_term: Option<String>,
    #[serde(alias = "LocationFilter")]
    pub location_filter: Option<String>,
    #[serde(alias = "EmployerNameFilter")]
    pub employer_name_filter: Option<String>,
    #[serde(alias = "CurrentPage")]
    pub current_page: Option<String>,
}

impl JobListState {
    pub fn page(&self) -> i64 {
        parse_page(self.current_page.as_deref())
    }
}

/// Employer list state carried through the employer forms.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerListState {
    #[serde(alias = "EmployerSearchTerm")]
    pub employer_search_term: Option<String>,
    #[serde(alias = "CurrentPage")]
    pub current_page: Option<String>,
}

impl EmployerListState {
    pub fn page(&self) -> i64 {
        parse_page(self.current_page.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Flash {
    Message(String),
    Error(String),
}

/// A redirect back to the dashboard with state in the query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub handler: Option<&'static str>,
    pub params: Vec<(&'static str, String)>,
    pub flash: Option<Flash>,
}

impl Redirect {
    fn dashboard(handler: Option<&'static str>) -> Self {
        Self {
            handler,
            params: Vec::new(),
            flash: None,
        }
    }

    /// Absent values are left out of the query string.
    fn param(mut self, key: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.params.push((key, value.to_string()));
        }
        self
    }

    fn page(self, page: i64) -> Self {
        self.param("currentPage", Some(&page.to_string()))
    }

    fn flash(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }

    fn carrying_jobs(self, state: &JobListState) -> Self {
        self.param("searchTerm", state.search_term.as_deref())
            .param("locationFilter", state.location_filter.as_deref())
    }

    fn carrying_employers(self, state: &EmployerListState) -> Self {
        self.param("employerSearchTerm", state.employer_search_term.as_deref())
            .page(state.page())
    }

    pub fn location(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(handler) = self.handler {
            query.append_pair("handler", handler);
        }
        for (key, value) in &self.params {
            query.append_pair(key, value);
        }
        let query = query.finish();
        if query.is_empty() {
            DASHBOARD_PATH.to_string()
        } else {
            format!("{}?{}", DASHBOARD_PATH, query)
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Field-level message; an empty `field` applies to the whole form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn form(message: impl Into<String>) -> Self {
        Self::new("", message)
    }
}

/// Result of a form handler. Handlers never fail: store errors become one
/// of these.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PageOutcome<T> {
    Show { form: T },
    Render { form: T, errors: Vec<FieldError> },
    Redirect(Redirect),
    NotFound { message: String },
}

impl<T> PageOutcome<T> {
    fn render(form: T, errors: Vec<FieldError>) -> Self {
        Self::Render { form, errors }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        match self {
            Self::Render { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn require(errors: &mut Vec<FieldError>, value: &Option<String>, field: &str, message: &str) {
    if present(value).is_none() {
        errors.push(FieldError::new(field, message));
    }
}

/// Required fields first; format checks only run once those pass.
pub fn validate_job(job: &JobInput) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, &job.title, "title", "Title is required");
    require(&mut errors, &job.employer_name, "employer_name", "Employer Name is required");
    require(&mut errors, &job.description, "description", "Description is required");
    require(&mut errors, &job.location, "location", "Location is required");
    require(&mut errors, &job.job_type, "job_type", "Job Type is required");
    if !errors.is_empty() {
        return errors;
    }

    if let Some(url) = present(&job.apply_url) {
        if !APPLY_URL.is_match(url) {
            warn!(apply_url = url, "invalid apply url format");
            errors.push(FieldError::new("apply_url", INVALID_URL));
        }
    }
    if let Some(location) = present(&job.location) {
        if !LOCATION.is_match(location) {
            warn!(location, "invalid location format");
            errors.push(FieldError::new("location", INVALID_LOCATION));
        }
    }
    errors
}

pub fn validate_employer(employer: &Employer) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, &employer.name, "employer_name", "Employer Name is required.");
    require(
        &mut errors,
        &employer.company_vision,
        "company_vision",
        "Company Vision is required.",
    );
    require(&mut errors, &employer.tech_stack, "tech_stack", "Tech Stack is required.");
    errors
}

// --- Jobs ---

pub fn create_job<S: ListingStore + ?Sized>(
    store: &S,
    input: JobInput,
    state: &JobListState,
) -> PageOutcome<JobInput> {
    let errors = validate_job(&input);
    if !errors.is_empty() {
        warn!(count = errors.len(), "create job called with invalid input");
        return PageOutcome::render(input, errors);
    }

    info!(title = ?input.title, employer = ?input.employer_name, "adding job");
    match store.add_job(input.clone().into_listing()) {
        Ok(job) => {
            info!(id = job.id(), title = job.title(), "job added");
            PageOutcome::Redirect(
                Redirect::dashboard(Some("ShowJobDetails"))
                    .param("id", job.id.as_deref())
                    .carrying_jobs(state)
                    .page(state.page())
                    .flash(Flash::Message(format!(
                        "Job '{}' created successfully.",
                        job.title()
                    ))),
            )
        }
        Err(e) => {
            error!(title = ?input.title, error = %e, "failed to add job");
            PageOutcome::render(
                input,
                vec![FieldError::form("An error occurred while creating the job.")],
            )
        }
    }
}

pub fn edit_job_form<S: ListingStore + ?Sized>(
    store: &S,
    id: Option<&str>,
) -> PageOutcome<JobInput> {
    let Some(id) = id.filter(|i| !i.is_empty()) else {
        warn!("edit job requested with null or empty id");
        return PageOutcome::not_found("Job ID cannot be empty.");
    };
    match store.get_job_by_id(id) {
        Ok(Some(job)) => {
            info!(id, "loaded job for editing");
            PageOutcome::Show {
                form: JobInput::from(&job),
            }
        }
        Ok(None) => {
            warn!(id, "job not found for editing");
            PageOutcome::not_found(format!("Job with ID '{}' not found.", id))
        }
        Err(e) => {
            error!(id, error = %e, "job lookup failed");
            PageOutcome::not_found(format!("Job with ID '{}' not found.", id))
        }
    }
}

pub fn update_job<S: ListingStore + ?Sized>(
    store: &S,
    input: JobInput,
    state: &JobListState,
) -> PageOutcome<JobInput> {
    let errors = validate_job(&input);
    if !errors.is_empty() {
        warn!(count = errors.len(), "update job called with invalid input");
        return PageOutcome::render(input, errors);
    }
    let Some(id) = present(&input.id).map(str::to_string) else {
        warn!("update job called without an id");
        return PageOutcome::not_found("Job ID cannot be empty.");
    };

    info!(id = %id, "updating job");
    match store.update_job(&input.clone().into_listing()) {
        Ok(()) => {
            info!(id = %id, "job updated");
            PageOutcome::Redirect(
                Redirect::dashboard(Some("ShowJobDetails"))
                    .param("id", Some(&id))
                    .carrying_jobs(state)
                    .param("employerNameFilter", state.employer_name_filter.as_deref())
                    .page(state.page()),
            )
        }
        Err(StoreError::JobNotFound(_)) => {
            warn!(id = %id, "job vanished before update");
            PageOutcome::not_found(format!("Job with ID '{}' not found.", id))
        }
        Err(e) => {
            error!(id = %id, error = %e, "failed to update job");
            PageOutcome::render(
                input,
                vec![FieldError::form("An error occurred while updating the job.")],
            )
        }
    }
}

pub fn delete_job_form<S: ListingStore + ?Sized>(
    store: &S,
    id: Option<&str>,
) -> PageOutcome<JobListing> {
    let Some(id) = id.filter(|i| !i.is_empty()) else {
        warn!("delete job confirmation requested with null or empty id");
        return PageOutcome::not_found("Job ID cannot be empty for deletion confirmation.");
    };
    match store.get_job_by_id(id) {
        Ok(Some(job)) => PageOutcome::Show { form: job },
        Ok(None) => {
            warn!(id, "job not found for deletion confirmation");
            PageOutcome::not_found(format!("Job with ID '{}' not found.", id))
        }
        Err(e) => {
            error!(id, error = %e, "job lookup failed");
            PageOutcome::not_found(format!("Job with ID '{}' not found.", id))
        }
    }
}

pub fn delete_job<S: ListingStore + ?Sized>(
    store: &S,
    id: Option<&str>,
    state: &JobListState,
) -> PageOutcome<JobListing> {
    let Some(id) = id.filter(|i| !i.is_empty()) else {
        warn!("delete job called with null or empty id");
        return PageOutcome::Redirect(Redirect::dashboard(None));
    };

    let failed = |e: StoreError| {
        error!(id, error = %e, "failed to delete job");
        PageOutcome::render(
            JobListing {
                id: Some(id.to_string()),
                ..Default::default()
            },
            vec![FieldError::form("An error occurred while deleting the job.")],
        )
    };

    info!(id, "deleting job");
    let job = match store.get_job_by_id(id) {
        Ok(Some(job)) => job,
        Ok(None) => {
            warn!(id, "job not found for deletion");
            return PageOutcome::not_found(format!("Job with ID '{}' not found to delete.", id));
        }
        Err(e) => return failed(e),
    };

    match store.delete_job(id) {
        Ok(()) => {
            info!(id, "job deleted");
            PageOutcome::Redirect(
                Redirect::dashboard(Some("ShowJobs"))
                    .carrying_jobs(state)
                    .param("employerNameFilter", state.employer_name_filter.as_deref())
                    .page(state.page())
                    .flash(Flash::Message(format!(
                        "Job '{}' deleted successfully.",
                        job.title()
                    ))),
            )
        }
        Err(StoreError::JobNotFound(_)) => {
            PageOutcome::not_found(format!("Job with ID '{}' not found to delete.", id))
        }
        Err(e) => failed(e),
    }
}

// --- Employers ---

pub fn create_employer<S: ListingStore + ?Sized>(
    store: &S,
    employer: Employer,
) -> PageOutcome<Employer> {
    let errors = validate_employer(&employer);
    if !errors.is_empty() {
        warn!(count = errors.len(), "create employer called with invalid input");
        return PageOutcome::render(employer, errors);
    }

    info!(name = employer.name(), "adding employer");
    match store.add_employer(&employer) {
        Ok(()) => {
            info!(name = employer.name(), "employer added");
            PageOutcome::Redirect(
                Redirect::dashboard(None)
                    .param("activeView", Some(EMPLOYERS_VIEW))
                    .flash(Flash::Message(format!(
                        "Employer '{}' created successfully.",
                        employer.name()
                    ))),
            )
        }
        Err(StoreError::DuplicateName(name)) => {
            warn!(name = %name, "employer already exists");
            let message = format!("An employer named '{}' already exists.", name);
            PageOutcome::render(employer, vec![FieldError::new("employer_name", message)])
        }
        Err(e) => {
            error!(name = employer.name(), error = %e, "failed to add employer");
            PageOutcome::render(
                employer,
                vec![FieldError::form(
                    "An error occurred while creating the employer. Please try again.",
                )],
            )
        }
    }
}

fn load_employer<S: ListingStore + ?Sized>(
    store: &S,
    name: Option<&str>,
    purpose: &str,
) -> PageOutcome<Employer> {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        warn!(purpose, "employer form requested with no name");
        return PageOutcome::not_found("Employer name cannot be empty.");
    };
    match store.get_employer_by_name(name) {
        Ok(Some(employer)) => PageOutcome::Show { form: employer },
        Ok(None) => {
            warn!(name, purpose, "employer not found");
            PageOutcome::not_found(format!("Employer '{}' not found.", name))
        }
        Err(e) => {
            error!(name, purpose, error = %e, "employer lookup failed");
            PageOutcome::not_found(format!("Employer '{}' not found.", name))
        }
    }
}

pub fn edit_employer_form<S: ListingStore + ?Sized>(
    store: &S,
    name: Option<&str>,
) -> PageOutcome<Employer> {
    load_employer(store, name, "edit")
}

pub fn delete_employer_form<S: ListingStore + ?Sized>(
    store: &S,
    name: Option<&str>,
) -> PageOutcome<Employer> {
    load_employer(store, name, "delete")
}

pub fn update_employer<S: ListingStore + ?Sized>(
    store: &S,
    employer: Employer,
    state: &EmployerListState,
) -> PageOutcome<Employer> {
    let errors = validate_employer(&employer);
    if !errors.is_empty() {
        warn!(count = errors.len(), "update employer called with invalid input");
        return PageOutcome::render(employer, errors);
    }

    info!(name = employer.name(), "updating employer");
    match store.update_employer(&employer) {
        Ok(()) => {
            info!(name = employer.name(), "employer updated");
            PageOutcome::Redirect(
                Redirect::dashboard(Some("ShowEmployers"))
                    .carrying_employers(state)
                    .flash(Flash::Message(format!(
                        "Employer '{}' updated successfully.",
                        employer.name()
                    ))),
            )
        }
        Err(StoreError::EmployerNotFound(name)) => {
            warn!(name = %name, "employer not found for update");
            PageOutcome::not_found(format!("Employer '{}' not found.", name))
        }
        Err(e) => {
            error!(name = employer.name(), error = %e, "failed to update employer");
            PageOutcome::render(
                employer,
                vec![FieldError::form(
                    "An error occurred while updating the employer. Please try again.",
                )],
            )
        }
    }
}

/// Always lands back on the employer listing; the flash says how it went.
pub fn delete_employer<S: ListingStore + ?Sized>(
    store: &S,
    name: Option<&str>,
    state: &EmployerListState,
) -> PageOutcome<Employer> {
    let back = Redirect::dashboard(Some("ShowEmployers")).carrying_employers(state);

    let Some(name) = name.filter(|n| !n.is_empty()) else {
        error!("delete employer called without a name");
        return PageOutcome::Redirect(back.flash(Flash::Error(
            "Could not delete employer: Information was missing. Please try again.".into(),
        )));
    };

    info!(name, "deleting employer");
    let flash = match store.delete_employer(name) {
        Ok(()) => {
            info!(name, "employer deleted");
            Flash::Message(format!("Employer '{}' deleted successfully.", name))
        }
        Err(e) => {
            error!(name, error = %e, "failed to delete employer");
            Flash::Error(format!(
                "An error occurred while deleting employer '{}'. Please try again.",
                name
            ))
        }
    };
    PageOutcome::Redirect(back.flash(flash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{seeded, FailingStore};
    use crate::db::Database;
    use crate::filter::JobFilter;

    fn valid_input() -> JobInput {
        JobInput {
            id: None,
            title: Some("Backend Engineer".into()),
            employer_name: Some("TechCorp".into()),
            description: Some("Build services".into()),
            location: Some("Seattle, WA".into()),
            apply_url: Some("https://techcorp.example/jobs/42".into()),
            job_type: Some("Full-time".into()),
        }
    }

    fn job_state() -> JobListState {
        JobListState {
            search_term: Some("Engineer".into()),
            location_filter: Some("Seattle, WA".into()),
            employer_name_filter: Some("Tech".into()),
            current_page: Some("2".into()),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    fn redirect<T: std::fmt::Debug>(outcome: PageOutcome<T>) -> Redirect {
        match outcome {
            PageOutcome::Redirect(r) => r,
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn required_fields_are_reported_before_formats() {
        let input = JobInput {
            location: Some("".into()),
            employer_name: Some("".into()),
            apply_url: Some("invalid-url".into()),
            ..Default::default()
        };
        let errors = validate_job(&input);
        assert_eq!(
            fields(&errors),
            vec!["title", "employer_name", "description", "location", "job_type"]
        );
        assert_eq!(errors[0].message, "Title is required");
    }

    #[test]
    fn url_and_location_formats_are_checked() {
        assert!(validate_job(&valid_input()).is_empty());

        for url in ["ftp://files.example.com/x", "HTTP://A.B", "https://x.io/a,b"] {
            let input = JobInput {
                apply_url: Some(url.into()),
                ..valid_input()
            };
            assert!(validate_job(&input).is_empty(), "{}", url);
        }
        for url in ["invalid-url", "www.example.com", "https://-bad.com"] {
            let input = JobInput {
                apply_url: Some(url.into()),
                ..valid_input()
            };
            assert_eq!(fields(&validate_job(&input)), vec!["apply_url"], "{}", url);
        }

        for loc in ["Remote", "remote", "St. Paul, MN", "Portland, or"] {
            let input = JobInput {
                location: Some(loc.into()),
                ..valid_input()
            };
            assert!(validate_job(&input).is_empty(), "{}", loc);
        }
        for loc in ["Seattle", "Seattle,WA", "Seattle, Washington", "Remote-ish"] {
            let input = JobInput {
                location: Some(loc.into()),
                ..valid_input()
            };
            let errors = validate_job(&input);
            assert_eq!(fields(&errors), vec!["location"], "{}", loc);
            assert_eq!(errors[0].message, INVALID_LOCATION);
        }

        let input = JobInput {
            apply_url: None,
            ..valid_input()
        };
        assert!(validate_job(&input).is_empty());
    }

    #[test]
    fn create_job_redirects_to_new_job_details() {
        let db = Database::open_in_memory().unwrap();
        let r = redirect(create_job(&db, valid_input(), &job_state()));

        let stored = db.list_jobs(&JobFilter::default()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(r.handler, Some("ShowJobDetails"));
        assert_eq!(r.get("id"), Some(stored[0].id()));
        assert_eq!(r.get("searchTerm"), Some("Engineer"));
        assert_eq!(r.get("locationFilter"), Some("Seattle, WA"));
        assert_eq!(r.get("currentPage"), Some("2"));
        assert_eq!(r.get("employerNameFilter"), None);
        assert_eq!(
            r.flash,
            Some(Flash::Message("Job 'Backend Engineer' created successfully.".into()))
        );
        assert!(r
            .location()
            .starts_with("/dashboard?handler=ShowJobDetails&id="));
        assert!(r.location().contains("locationFilter=Seattle%2C+WA"));
    }

    #[test]
    fn create_job_store_failure_rerenders() {
        let outcome = create_job(&FailingStore, valid_input(), &JobListState::default());
        assert_eq!(
            outcome.errors(),
            &[FieldError::form("An error occurred while creating the job.")]
        );
        match outcome {
            PageOutcome::Render { form, .. } => {
                assert_eq!(form.title.as_deref(), Some("Backend Engineer"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn edit_job_form_not_found_cases() {
        let db = seeded();
        assert_eq!(
            edit_job_form(&db, None),
            PageOutcome::not_found("Job ID cannot be empty.")
        );
        assert_eq!(
            edit_job_form(&db, Some("ghost")),
            PageOutcome::not_found("Job with ID 'ghost' not found.")
        );
        match edit_job_form(&db, Some("techcorp-18")) {
            PageOutcome::Show { form } => {
                assert_eq!(form.title.as_deref(), Some("Software Developer"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn update_job_carries_employer_filter() {
        let db = seeded();
        let input = JobInput {
            id: Some("techcorp-18".into()),
            location: Some("Remote".into()),
            ..valid_input()
        };
        let r = redirect(update_job(&db, input, &job_state()));
        assert_eq!(r.handler, Some("ShowJobDetails"));
        assert_eq!(r.get("id"), Some("techcorp-18"));
        assert_eq!(r.get("employerNameFilter"), Some("Tech"));
        assert!(r.flash.is_none());

        let job = db.get_job_by_id("techcorp-18").unwrap().unwrap();
        assert_eq!(job.title(), "Backend Engineer");
        assert_eq!(job.location.as_deref(), Some("Remote"));
    }

    #[test]
    fn update_job_errors() {
        let db = seeded();
        let ghost = JobInput {
            id: Some("ghost".into()),
            ..valid_input()
        };
        assert!(matches!(
            update_job(&db, ghost, &JobListState::default()),
            PageOutcome::NotFound { .. }
        ));

        let bad = JobInput {
            id: Some("techcorp-18".into()),
            location: Some("Nowhere".into()),
            ..valid_input()
        };
        assert_eq!(
            fields(update_job(&db, bad, &JobListState::default()).errors()),
            vec!["location"]
        );

        let input = JobInput {
            id: Some("x".into()),
            ..valid_input()
        };
        assert_eq!(
            update_job(&FailingStore, input, &JobListState::default()).errors(),
            &[FieldError::form("An error occurred while updating the job.")]
        );
    }

    #[test]
    fn delete_job_flow() {
        let db = seeded();
        assert!(matches!(delete_job_form(&db, Some("")), PageOutcome::NotFound { .. }));
        assert!(matches!(delete_job_form(&db, Some("techcorp-18")), PageOutcome::Show { .. }));

        let r = redirect(delete_job(&db, None, &job_state()));
        assert_eq!(r.location(), "/dashboard");

        assert_eq!(
            delete_job(&db, Some("ghost"), &job_state()),
            PageOutcome::not_found("Job with ID 'ghost' not found to delete.")
        );

        let r = redirect(delete_job(&db, Some("techcorp-18"), &job_state()));
        assert_eq!(r.handler, Some("ShowJobs"));
        assert_eq!(r.get("employerNameFilter"), Some("Tech"));
        assert_eq!(
            r.flash,
            Some(Flash::Message("Job 'Software Developer' deleted successfully.".into()))
        );
        assert!(db.get_job_by_id("techcorp-18").unwrap().is_none());

        assert_eq!(
            delete_job(&FailingStore, Some("x"), &job_state()).errors(),
            &[FieldError::form("An error occurred while deleting the job.")]
        );
    }

    #[test]
    fn create_employer_validates_and_redirects() {
        let db = seeded();
        let outcome = create_employer(&db, Employer::default());
        assert_eq!(
            fields(outcome.errors()),
            vec!["employer_name", "company_vision", "tech_stack"]
        );

        let r = redirect(create_employer(&db, Employer::new("NewCo", "Grow", "Go")));
        assert_eq!(r.location(), "/dashboard?activeView=Employers");
        assert_eq!(
            r.flash,
            Some(Flash::Message("Employer 'NewCo' created successfully.".into()))
        );

        let dup = create_employer(&db, Employer::new("newco", "Again", "Go"));
        assert_eq!(fields(dup.errors()), vec!["employer_name"]);

        let failed = create_employer(&FailingStore, Employer::new("X", "v", "s"));
        assert_eq!(
            failed.errors()[0].message,
            "An error occurred while creating the employer. Please try again."
        );
    }

    #[test]
    fn employer_edit_and_update() {
        let db = seeded();
        assert!(matches!(edit_employer_form(&db, None), PageOutcome::NotFound { .. }));
        assert!(matches!(
            edit_employer_form(&db, Some("Ghost")),
            PageOutcome::NotFound { .. }
        ));
        assert!(matches!(
            edit_employer_form(&db, Some("WebCorp")),
            PageOutcome::Show { .. }
        ));

        let state = EmployerListState {
            employer_search_term: Some("Corp".into()),
            current_page: Some("abc".into()),
        };
        let r = redirect(update_employer(&db, Employer::new("WebCorp", "New", "Elm"), &state));
        assert_eq!(
            r.location(),
            "/dashboard?handler=ShowEmployers&employerSearchTerm=Corp&currentPage=1"
        );
        assert_eq!(
            db.get_employer_by_name("WebCorp").unwrap().unwrap().tech_stack.as_deref(),
            Some("Elm")
        );

        assert!(matches!(
            update_employer(&db, Employer::new("Ghost", "v", "s"), &state),
            PageOutcome::NotFound { .. }
        ));
        let bad = Employer {
            tech_stack: None,
            ..Employer::new("WebCorp", "v", "s")
        };
        assert_eq!(fields(update_employer(&db, bad, &state).errors()), vec!["tech_stack"]);
    }

    #[test]
    fn delete_employer_always_redirects() {
        let db = seeded();
        let state = EmployerListState {
            employer_search_term: Some("Data".into()),
            current_page: Some("3".into()),
        };
        assert!(matches!(delete_employer_form(&db, Some("DataCorp")), PageOutcome::Show { .. }));

        let r = redirect(delete_employer(&db, Some("DataCorp"), &state));
        assert_eq!(r.handler, Some("ShowEmployers"));
        assert_eq!(r.get("employerSearchTerm"), Some("Data"));
        assert_eq!(r.get("currentPage"), Some("3"));
        assert_eq!(
            r.flash,
            Some(Flash::Message("Employer 'DataCorp' deleted successfully.".into()))
        );

        let r = redirect(delete_employer(&db, Some(""), &state));
        assert!(matches!(r.flash, Some(Flash::Error(_))));

        let r = redirect(delete_employer(&db, Some("DataCorp"), &state));
        assert_eq!(
            r.flash,
            Some(Flash::Error(
                "An error occurred while deleting employer 'DataCorp'. Please try again.".into()
            ))
        );
    }
}
