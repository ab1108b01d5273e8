#![deny(clippy::all)]
pub mod bulk;
mod error;
pub mod pagination;
pub mod resources;
pub mod retry;
pub mod search;

use chrono::NaiveDate;
use http::Method;
use log::debug;
use once_cell::sync::Lazy;
use reqwest::{
    blocking::{Client as HttpClient, Response as HttpResponse},
    header::{HeaderMap, HeaderValue, ACCEPT},
    IntoUrl, Proxy, Result as ReqwestResult,
};
use resources::{
    billing::BreakdownQuery,
    export::{CopyOnlyQuery, GetExportsRequest},
    file::{BulkDeleteRequest, CopyRequest, FilesQuery, RenameRequest},
    task::TasksQuery,
    ApiErrorBody, BulkRequest, ListResponse, PageQuery, ALL_FIELDS,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{cell::Cell, collections::BTreeMap, fmt::Display, time::Duration};
use url::Url;

use crate::retry::{Retrier, RetryConfig};

pub use crate::{
    bulk::{
        submit_and_wait, submit_and_wait_observed, BulkDelete, BulkExport, BulkItemError,
        BulkJob, BulkOperation, BulkOptions, Deletion, JobState, Submission,
    },
    error::{Error, Result},
    pagination::{fetch_all, OffsetPages, Page, DEFAULT_PAGE_SIZE},
    resources::{
        billing::{BillingGroup, Id as BillingGroupId, StorageBreakdown},
        export::{check_exportable, Export, NewExport, NotExportable},
        file::{CopiedFile, File, FileRef, Id as FileId, Kind as FileKind, StorageType},
        project::{Id as ProjectId, Member, NewProject, Permissions, Project},
        task::{ExecutionDetails, Id as TaskId, NewTask, Status as TaskStatus, Task},
        user::User,
        BulkRecord,
    },
    search::{find_by_name, list_project_files, resolve_file, walk_tree, FileStore},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token(pub String);

pub struct Config {
    pub endpoint: Url,
    pub token: Token,
    pub accept_invalid_certificates: bool,
    pub proxy: Option<Url>,
    /// Retry settings to use, if any. This will apply to all requests except for those which
    /// are not idempotent (as they cannot be naively retried).
    pub retry_config: Option<RetryConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: DEFAULT_ENDPOINT.clone(),
            token: Token("".to_owned()),
            accept_invalid_certificates: false,
            proxy: None,
            retry_config: None,
        }
    }
}

#[derive(Debug)]
pub struct Client {
    endpoints: Endpoints,
    http_client: HttpClient,
    headers: HeaderMap,
    retrier: Option<Retrier>,
}

impl Client {
    /// Create a new API client.
    pub fn new(config: Config) -> Result<Client> {
        let http_client = build_http_client(&config)?;
        let headers = build_headers(&config)?;
        let endpoints = Endpoints::new(config.endpoint)?;
        let retrier = config.retry_config.map(Retrier::new);
        Ok(Client {
            endpoints,
            http_client,
            headers,
            retrier,
        })
    }

    /// Get the base url for the client
    pub fn base_url(&self) -> &Url {
        &self.endpoints.base
    }

    pub fn get_current_user(&self) -> Result<User> {
        self.get(self.endpoints.user.clone())
    }

    pub fn get_file(&self, file: &FileId) -> Result<File> {
        self.get(self.endpoints.file(file)?)
    }

    /// One page of the files at the root of `project`, optionally only those named `name`.
    pub fn query_files_page(
        &self,
        project: &ProjectId,
        name: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Page<File>> {
        self.get_page(
            self.endpoints.files.clone(),
            &FilesQuery {
                project: &project.0,
                name,
                limit,
                offset,
                fields: ALL_FIELDS,
            },
            limit,
            offset,
        )
    }

    pub fn list_folder_page(
        &self,
        folder: &FileId,
        limit: usize,
        offset: usize,
    ) -> Result<Page<File>> {
        self.get_page(
            self.endpoints.folder_children(folder)?,
            &PageQuery::new(limit, offset),
            limit,
            offset,
        )
    }

    /// Every file and folder at the root of `project`.
    pub fn get_all_files(&self, project: &ProjectId, page_size: usize) -> Result<Vec<File>> {
        fetch_all(
            |limit, offset| self.query_files_page(project, None, limit, offset),
            page_size,
        )
    }

    pub fn rename_file(&self, file: &FileId, new_name: &str) -> Result<File> {
        self.request(
            &Method::PATCH,
            &self.endpoints.file(file)?,
            &Some(RenameRequest { name: new_name }),
            &None::<()>,
            &Retry::Yes,
        )
    }

    /// Merge `metadata` into the existing metadata of `file`.
    pub fn update_file_metadata(
        &self,
        file: &FileId,
        metadata: &Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        self.request(
            &Method::PATCH,
            &self.endpoints.file_metadata(file)?,
            &Some(metadata),
            &None::<()>,
            &Retry::Yes,
        )
    }

    pub fn delete_file(&self, file: &FileId) -> Result<()> {
        self.delete(self.endpoints.file(file)?)
    }

    /// Delete up to [`BulkOptions::MAX_CHUNK_SIZE`] files, one record per file in order.
    pub fn delete_files(&self, files: &[FileId]) -> Result<Vec<BulkRecord<Value>>> {
        let response: ListResponse<BulkRecord<Value>> = self.post(
            self.endpoints.bulk_delete_files.clone(),
            BulkDeleteRequest { file_ids: files },
            Retry::Yes,
        )?;
        Ok(response.items)
    }

    /// Copy files into `project`, keyed by source file id.
    pub fn copy_files(
        &self,
        files: &[FileId],
        project: &ProjectId,
    ) -> Result<BTreeMap<String, CopiedFile>> {
        self.post(
            self.endpoints.copy_files.clone(),
            CopyRequest {
                file_ids: files,
                project: &project.0,
            },
            Retry::No,
        )
    }

    pub fn create_exports(
        &self,
        exports: &[NewExport],
        copy_only: bool,
    ) -> Result<Vec<BulkRecord<Export>>> {
        let response: ListResponse<BulkRecord<Export>> = self.request(
            &Method::POST,
            &self.endpoints.create_exports.clone(),
            &Some(BulkRequest { items: exports }),
            &Some(CopyOnlyQuery { copy_only }),
            &Retry::No,
        )?;
        Ok(response.items)
    }

    pub fn get_exports<'a>(
        &self,
        exports: impl Iterator<Item = &'a str>,
    ) -> Result<Vec<BulkRecord<Export>>> {
        let response: ListResponse<BulkRecord<Export>> = self.post(
            self.endpoints.get_exports.clone(),
            GetExportsRequest {
                export_ids: exports.collect(),
            },
            Retry::Yes,
        )?;
        Ok(response.items)
    }

    pub fn get_task(&self, task: &TaskId) -> Result<Task> {
        self.get(self.endpoints.task(task)?)
    }

    pub fn query_tasks_page(
        &self,
        project: &ProjectId,
        status: Option<&TaskStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<Page<Task>> {
        self.get_page(
            self.endpoints.tasks.clone(),
            &TasksQuery {
                project: &project.0,
                status: status.map(ToString::to_string),
                limit,
                offset,
                fields: ALL_FIELDS,
            },
            limit,
            offset,
        )
    }

    /// Every task in `project`, optionally only those in `status`.
    pub fn get_all_tasks(
        &self,
        project: &ProjectId,
        status: Option<&TaskStatus>,
        page_size: usize,
    ) -> Result<Vec<Task>> {
        fetch_all(
            |limit, offset| self.query_tasks_page(project, status, limit, offset),
            page_size,
        )
    }

    /// Create a task in draft state.
    pub fn create_task(&self, task: &NewTask) -> Result<Task> {
        self.post(self.endpoints.tasks.clone(), task, Retry::No)
    }

    pub fn run_task(&self, task: &TaskId) -> Result<Task> {
        self.task_action(task, "run")
    }

    pub fn abort_task(&self, task: &TaskId) -> Result<Task> {
        self.task_action(task, "abort")
    }

    fn task_action(&self, task: &TaskId, action: &str) -> Result<Task> {
        self.request(
            &Method::POST,
            &self.endpoints.task_action(task, action)?,
            &None::<()>,
            &None::<()>,
            &Retry::No,
        )
    }

    pub fn delete_task(&self, task: &TaskId) -> Result<()> {
        self.delete(self.endpoints.task(task)?)
    }

    pub fn get_execution_details(&self, task: &TaskId) -> Result<ExecutionDetails> {
        self.get(self.endpoints.task_execution_details(task)?)
    }

    pub fn get_project(&self, project: &ProjectId) -> Result<Project> {
        self.get(self.endpoints.project(project)?)
    }

    pub fn get_all_projects(&self, page_size: usize) -> Result<Vec<Project>> {
        fetch_all(
            |limit, offset| {
                self.get_page(
                    self.endpoints.projects.clone(),
                    &PageQuery::new(limit, offset),
                    limit,
                    offset,
                )
            },
            page_size,
        )
    }

    pub fn create_project(&self, project: NewProject<'_>) -> Result<Project> {
        self.post(self.endpoints.projects.clone(), project, Retry::No)
    }

    pub fn get_all_project_members(
        &self,
        project: &ProjectId,
        page_size: usize,
    ) -> Result<Vec<Member>> {
        let url = self.endpoints.project_members(project)?;
        fetch_all(
            |limit, offset| {
                self.get_page(url.clone(), &PageQuery::new(limit, offset), limit, offset)
            },
            page_size,
        )
    }

    pub fn add_project_member(
        &self,
        project: &ProjectId,
        username: &str,
        permissions: Permissions,
    ) -> Result<Member> {
        self.post(
            self.endpoints.project_members(project)?,
            Member {
                username: username.to_owned(),
                permissions,
            },
            Retry::No,
        )
    }

    pub fn get_all_billing_groups(&self, page_size: usize) -> Result<Vec<BillingGroup>> {
        fetch_all(
            |limit, offset| {
                self.get_page(
                    self.endpoints.billing_groups.clone(),
                    &PageQuery::new(limit, offset),
                    limit,
                    offset,
                )
            },
            page_size,
        )
    }

    /// Storage costs per project charged to `group` between two dates, inclusive.
    pub fn get_all_storage_breakdowns(
        &self,
        group: &BillingGroupId,
        date_from: NaiveDate,
        date_to: NaiveDate,
        page_size: usize,
    ) -> Result<Vec<StorageBreakdown>> {
        let url = self.endpoints.storage_breakdown(group)?;
        fetch_all(
            |limit, offset| {
                self.get_page(
                    url.clone(),
                    &BreakdownQuery {
                        date_from,
                        date_to,
                        limit,
                        offset,
                    },
                    limit,
                    offset,
                )
            },
            page_size,
        )
    }

    fn get<LocationT, SuccessT>(&self, url: LocationT) -> Result<SuccessT>
    where
        LocationT: IntoUrl + Display + Clone,
        for<'de> SuccessT: Deserialize<'de>,
    {
        self.request(&Method::GET, &url, &None::<()>, &None::<()>, &Retry::Yes)
    }

    fn get_page<LocationT, QueryT, ItemT>(
        &self,
        url: LocationT,
        query: &QueryT,
        limit: usize,
        offset: usize,
    ) -> Result<Page<ItemT>>
    where
        LocationT: IntoUrl + Display + Clone,
        QueryT: Serialize,
        for<'de> ItemT: Deserialize<'de>,
    {
        debug!("Attempting GET `{}` at offset {}", url, offset);
        let http_response =
            self.raw_request(&Method::GET, &url, &None::<()>, &Some(query), &Retry::Yes)?;
        let total = http_response
            .headers()
            .get(TOTAL_MATCHING_QUERY)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<usize>().ok());
        let items = parse_response::<ListResponse<ItemT>>(http_response)?.items;

        // Without a reported total, assume this is the last page.
        let total = total.unwrap_or(offset + items.len());
        Ok(Page {
            items,
            total,
            offset,
            limit,
        })
    }

    fn delete<LocationT>(&self, url: LocationT) -> Result<()>
    where
        LocationT: IntoUrl + Display + Clone,
    {
        debug!("Attempting DELETE `{}`", url);

        let attempts = Cell::new(0);
        let http_response = self
            .with_retries(|| {
                attempts.set(attempts.get() + 1);
                self.http_client
                    .delete(url.clone())
                    .headers(self.headers.clone())
                    .send()
            })
            .map_err(|source| Error::ReqwestError {
                source,
                message: "DELETE operation failed.".to_owned(),
            })?;

        let status = http_response.status();
        if status.is_success() {
            return Ok(());
        }
        // Ignore 404 not found if the request had to be re-tried - assume the target
        // object was deleted on a previous incomplete request.
        if attempts.get() > 1 && status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(api_error(status, http_response))
    }

    fn post<LocationT, RequestT, SuccessT>(
        &self,
        url: LocationT,
        request: RequestT,
        retry: Retry,
    ) -> Result<SuccessT>
    where
        LocationT: IntoUrl + Display + Clone,
        RequestT: Serialize,
        for<'de> SuccessT: Deserialize<'de>,
    {
        self.request(&Method::POST, &url, &Some(request), &None::<()>, &retry)
    }

    fn raw_request<LocationT, RequestT, QueryT>(
        &self,
        method: &Method,
        url: &LocationT,
        body: &Option<RequestT>,
        query: &Option<QueryT>,
        retry: &Retry,
    ) -> Result<HttpResponse>
    where
        LocationT: IntoUrl + Display + Clone,
        RequestT: Serialize,
        QueryT: Serialize,
    {
        let do_request = || {
            let request = self
                .http_client
                .request(method.clone(), url.clone())
                .headers(self.headers.clone());
            let request = match &query {
                Some(query) => request.query(query),
                None => request,
            };
            let request = match &body {
                Some(body) => request.json(body),
                None => request,
            };
            request.send()
        };

        let result = match retry {
            Retry::Yes => self.with_retries(do_request),
            Retry::No => do_request(),
        };
        let http_response = result.map_err(|source| Error::ReqwestError {
            source,
            message: format!("{method} operation failed."),
        })?;

        Ok(http_response)
    }

    fn request<LocationT, RequestT, SuccessT, QueryT>(
        &self,
        method: &Method,
        url: &LocationT,
        body: &Option<RequestT>,
        query: &Option<QueryT>,
        retry: &Retry,
    ) -> Result<SuccessT>
    where
        LocationT: IntoUrl + Display + Clone,
        RequestT: Serialize,
        QueryT: Serialize,
        for<'de> SuccessT: Deserialize<'de>,
    {
        debug!("Attempting {} `{}`", method, url);
        let http_response = self.raw_request(method, url, body, query, retry)?;
        parse_response(http_response)
    }

    fn with_retries(
        &self,
        send_request: impl Fn() -> ReqwestResult<HttpResponse>,
    ) -> ReqwestResult<HttpResponse> {
        match &self.retrier {
            Some(retrier) => retrier.with_retries(send_request),
            None => send_request(),
        }
    }
}

impl FileStore for Client {
    fn query_files(
        &self,
        project: &ProjectId,
        name: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Page<File>> {
        self.query_files_page(project, name, limit, offset)
    }

    fn list_folder(&self, folder: &FileId, limit: usize, offset: usize) -> Result<Page<File>> {
        self.list_folder_page(folder, limit, offset)
    }
}

#[derive(Copy, Clone)]
enum Retry {
    Yes,
    No,
}

fn parse_response<SuccessT>(http_response: HttpResponse) -> Result<SuccessT>
where
    for<'de> SuccessT: Deserialize<'de>,
{
    let status = http_response.status();
    if status.is_success() {
        http_response
            .json::<SuccessT>()
            .map_err(Error::BadJsonResponse)
    } else {
        Err(api_error(status, http_response))
    }
}

fn api_error(status: reqwest::StatusCode, http_response: HttpResponse) -> Error {
    match http_response.json::<ApiErrorBody>() {
        Ok(body) => body.into_error_kind(status),
        Err(_) => Error::Api {
            status_code: status,
            code: None,
            message: status.canonical_reason().unwrap_or_default().to_owned(),
        },
    }
}

#[derive(Debug)]
struct Endpoints {
    base: Url,
    user: Url,
    files: Url,
    tasks: Url,
    projects: Url,
    billing_groups: Url,
    copy_files: Url,
    bulk_delete_files: Url,
    create_exports: Url,
    get_exports: Url,
}

fn construct_endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut endpoint = base.clone();

    let mut endpoint_segments = endpoint
        .path_segments_mut()
        .map_err(|_| Error::BadEndpoint {
            endpoint: base.clone(),
        })?;

    endpoint_segments.pop_if_empty();
    for segment in segments {
        endpoint_segments.push(segment);
    }

    drop(endpoint_segments);

    Ok(endpoint)
}

impl Endpoints {
    pub fn new(base: Url) -> Result<Self> {
        let user = construct_endpoint(&base, &["user"])?;
        let files = construct_endpoint(&base, &["files"])?;
        let tasks = construct_endpoint(&base, &["tasks"])?;
        let projects = construct_endpoint(&base, &["projects"])?;
        let billing_groups = construct_endpoint(&base, &["billing", "groups"])?;
        let copy_files = construct_endpoint(&base, &["action", "files", "copy"])?;
        let bulk_delete_files = construct_endpoint(&base, &["bulk", "files", "delete"])?;
        let create_exports =
            construct_endpoint(&base, &["bulk", "storage", "exports", "create"])?;
        let get_exports = construct_endpoint(&base, &["bulk", "storage", "exports", "get"])?;

        Ok(Endpoints {
            base,
            user,
            files,
            tasks,
            projects,
            billing_groups,
            copy_files,
            bulk_delete_files,
            create_exports,
            get_exports,
        })
    }

    fn file(&self, file: &FileId) -> Result<Url> {
        construct_endpoint(&self.base, &["files", &file.0])
    }

    fn file_metadata(&self, file: &FileId) -> Result<Url> {
        construct_endpoint(&self.base, &["files", &file.0, "metadata"])
    }

    fn folder_children(&self, folder: &FileId) -> Result<Url> {
        construct_endpoint(&self.base, &["files", &folder.0, "list"])
    }

    fn task(&self, task: &TaskId) -> Result<Url> {
        construct_endpoint(&self.base, &["tasks", &task.0])
    }

    fn task_action(&self, task: &TaskId, action: &str) -> Result<Url> {
        construct_endpoint(&self.base, &["tasks", &task.0, "actions", action])
    }

    fn task_execution_details(&self, task: &TaskId) -> Result<Url> {
        construct_endpoint(&self.base, &["tasks", &task.0, "execution_details"])
    }

    fn project(&self, project: &ProjectId) -> Result<Url> {
        construct_endpoint(&self.base, &["projects", project.owner(), project.name()])
    }

    fn project_members(&self, project: &ProjectId) -> Result<Url> {
        construct_endpoint(
            &self.base,
            &["projects", project.owner(), project.name(), "members"],
        )
    }

    fn storage_breakdown(&self, group: &BillingGroupId) -> Result<Url> {
        construct_endpoint(
            &self.base,
            &["billing", "groups", &group.0, "breakdown", "storage"],
        )
    }
}

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 120;

const AUTH_TOKEN: &str = "x-sbg-auth-token";
const TOTAL_MATCHING_QUERY: &str = "x-total-matching-query";

fn build_http_client(config: &Config) -> Result<HttpClient> {
    let mut builder = HttpClient::builder()
        .gzip(true)
        .danger_accept_invalid_certs(config.accept_invalid_certificates)
        .timeout(Some(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS)));

    if let Some(proxy) = config.proxy.clone() {
        builder = builder.proxy(Proxy::all(proxy).map_err(Error::BuildHttpClient)?);
    }
    builder.build().map_err(Error::BuildHttpClient)
}

fn build_headers(config: &Config) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTH_TOKEN,
        HeaderValue::from_str(&config.token.0).map_err(|_| Error::BadToken)?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

pub static DEFAULT_ENDPOINT: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://cavatica-api.sbgenomics.com/v2").expect("Default URL is well-formed")
});

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn client(server: &Server) -> Client {
        Client::new(Config {
            endpoint: Url::parse(&server.url()).unwrap(),
            token: Token("s3cr3t".to_owned()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_construct_endpoint() {
        let expected = "https://cavatica-api.sbgenomics.com/v2/tasks/t1/actions/run";
        for base in [
            "https://cavatica-api.sbgenomics.com/v2",
            "https://cavatica-api.sbgenomics.com/v2/",
        ] {
            let url = construct_endpoint(
                &Url::parse(base).unwrap(),
                &["tasks", "t1", "actions", "run"],
            )
            .unwrap();
            assert_eq!(url.to_string(), expected);
        }

        let root = construct_endpoint(&Url::parse("http://127.0.0.1:1234").unwrap(), &["files"])
            .unwrap();
        assert_eq!(root.to_string(), "http://127.0.0.1:1234/files");
    }

    #[test]
    fn test_project_endpoint_keeps_owner_and_name_segments() {
        let endpoints = Endpoints::new(DEFAULT_ENDPOINT.clone()).unwrap();
        assert_eq!(
            endpoints
                .project_members(&ProjectId("alice/rna-seq".to_owned()))
                .unwrap()
                .to_string(),
            "https://cavatica-api.sbgenomics.com/v2/projects/alice/rna-seq/members"
        );
    }

    #[test]
    fn test_query_files_page_reads_total_header() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/files")
            .match_header("x-sbg-auth-token", "s3cr3t")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("project".into(), "alice/test".into()),
                Matcher::UrlEncoded("name".into(), "S1.bam".into()),
                Matcher::UrlEncoded("limit".into(), "50".into()),
                Matcher::UrlEncoded("offset".into(), "0".into()),
            ]))
            .with_header("X-Total-Matching-Query", "1")
            .with_body(json!({"items": [{"id": "f1", "name": "S1.bam"}]}).to_string())
            .create();

        let page = client(&server)
            .query_files_page(&ProjectId("alice/test".to_owned()), Some("S1.bam"), 50, 0)
            .unwrap();

        mock.assert();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, FileId("f1".to_owned()));
    }

    #[test]
    fn test_get_all_files_follows_offsets() {
        let mut server = Server::new();
        let first = server
            .mock("GET", "/files")
            .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
            .with_header("X-Total-Matching-Query", "3")
            .with_body(
                json!({"items": [{"id": "f1", "name": "a"}, {"id": "f2", "name": "b"}]})
                    .to_string(),
            )
            .create();
        let second = server
            .mock("GET", "/files")
            .match_query(Matcher::UrlEncoded("offset".into(), "2".into()))
            .with_header("X-Total-Matching-Query", "3")
            .with_body(json!({"items": [{"id": "f3", "name": "c"}]}).to_string())
            .create();

        let files = client(&server)
            .get_all_files(&ProjectId("alice/test".to_owned()), 2)
            .unwrap();

        first.assert();
        second.assert();
        assert_eq!(
            files.into_iter().map(|file| file.name).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_api_error_is_parsed() {
        let mut server = Server::new();
        server
            .mock("GET", "/files/missing")
            .with_status(404)
            .with_body(
                json!({
                    "status": 404,
                    "code": 5002,
                    "message": "Requested file does not exist",
                    "more_info": "https://docs.sevenbridges.com/reference/api-status-codes"
                })
                .to_string(),
            )
            .create();

        let error = client(&server)
            .get_file(&FileId("missing".to_owned()))
            .unwrap_err();

        assert!(error.is_not_found());
        match error {
            Error::Api { code, message, .. } => {
                assert_eq!(code, Some(5002));
                assert!(message.starts_with("Requested file does not exist"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_delete_task_accepts_no_content() {
        let mut server = Server::new();
        let mock = server
            .mock("DELETE", "/tasks/t1")
            .with_status(204)
            .create();

        client(&server).delete_task(&TaskId("t1".to_owned())).unwrap();
        mock.assert();
    }

    #[test]
    fn test_create_exports_sends_items() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/bulk/storage/exports/create")
            .match_query(Matcher::UrlEncoded("copy_only".into(), "false".into()))
            .match_body(Matcher::Json(json!({
                "items": [{
                    "source": {"file": "f1"},
                    "destination": {"volume": "alice/bucket", "location": "out/S1.bam"},
                    "overwrite": true
                }]
            })))
            .with_body(
                json!({"items": [{"resource": {
                    "id": "e1",
                    "state": "PENDING",
                    "source": {"file": "f1"},
                    "destination": {"volume": "alice/bucket", "location": "out/S1.bam"}
                }}]})
                .to_string(),
            )
            .create();

        let file = File {
            id: FileId("f1".to_owned()),
            name: "S1.bam".to_owned(),
            ..Default::default()
        };
        let records = client(&server)
            .create_exports(&[NewExport::new(&file, "alice/bucket", "out", true)], false)
            .unwrap();

        mock.assert();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].resource.as_ref().map(|export| export.state),
            Some(JobState::Pending)
        );
    }

    fn export_record(id: &str, file: &str, state: &str) -> Value {
        json!({"resource": {
            "id": id,
            "state": state,
            "source": {"file": file},
            "destination": {"volume": "alice/bucket", "location": format!("harmonized/{file}.bam")}
        }})
    }

    fn files(ids: &[&str]) -> Vec<File> {
        ids.iter()
            .map(|id| File {
                id: FileId(id.to_string()),
                name: format!("{id}.bam"),
                ..Default::default()
            })
            .collect()
    }

    fn bulk_export(client: &Client) -> BulkExport<'_> {
        BulkExport {
            client,
            volume: "alice/bucket".to_owned(),
            location: "harmonized".to_owned(),
            overwrite: true,
            copy_only: false,
        }
    }

    #[test]
    fn test_bulk_export_submit_maps_records() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/bulk/storage/exports/create")
            .match_query(Matcher::UrlEncoded("copy_only".into(), "false".into()))
            .with_body(
                json!({"items": [
                    export_record("e1", "f1", "PENDING"),
                    {"error": {"status": 400, "code": 9107, "message": "Destination already exists"}},
                    {}
                ]})
                .to_string(),
            )
            .expect(1)
            .create();
        let client = client(&server);

        let submissions = bulk_export(&client)
            .submit(&files(&["f1", "f2", "f3"]))
            .unwrap();

        mock.assert();
        assert_eq!(submissions.len(), 3);
        assert!(matches!(
            &submissions[0],
            Submission::Accepted(export) if export.id.0 == "e1" && export.state == JobState::Pending
        ));
        assert!(matches!(
            &submissions[1],
            Submission::Rejected(error)
                if error.status == Some(400) && error.message == "Destination already exists"
        ));
        assert!(matches!(
            &submissions[2],
            Submission::Rejected(error) if error.message == "no export was created"
        ));
    }

    #[test]
    fn test_bulk_export_poll_fails_jobs_without_resource() {
        let mut server = Server::new();
        let submit = server
            .mock("POST", "/bulk/storage/exports/create")
            .match_query(Matcher::Any)
            .with_body(
                json!({"items": [
                    export_record("e1", "f1", "PENDING"),
                    export_record("e2", "f2", "RUNNING")
                ]})
                .to_string(),
            )
            .create();
        let poll = server
            .mock("POST", "/bulk/storage/exports/get")
            .match_body(Matcher::Json(json!({"export_ids": ["e1", "e2"]})))
            .with_body(
                json!({"items": [
                    export_record("e1", "f1", "COMPLETED"),
                    {"error": {"status": 404, "message": "Export not found"}}
                ]})
                .to_string(),
            )
            .expect(1)
            .create();
        let client = client(&server);
        let export = bulk_export(&client);

        let jobs = export
            .submit(&files(&["f1", "f2"]))
            .unwrap()
            .into_iter()
            .filter_map(|submission| match submission {
                Submission::Accepted(job) => Some(job),
                Submission::Rejected(_) => None,
            })
            .collect::<Vec<_>>();
        let polled = export.poll(&jobs).unwrap();

        submit.assert();
        poll.assert();
        assert_eq!(
            polled.iter().map(|job| job.state).collect::<Vec<_>>(),
            vec![JobState::Completed, JobState::Failed]
        );
        assert_eq!(polled[1].id.0, "e2");
        assert_eq!(
            polled[1].error.as_ref().map(|error| error.message.as_str()),
            Some("Export not found")
        );
        assert!(polled[1].failure_message().is_some());
    }

    #[test]
    fn test_bulk_export_rejects_short_response() {
        let mut server = Server::new();
        let _create = server
            .mock("POST", "/bulk/storage/exports/create")
            .match_query(Matcher::Any)
            .with_body(json!({"items": [export_record("e1", "f1", "PENDING")]}).to_string())
            .create();
        let client = client(&server);

        let result = bulk_export(&client).submit(&files(&["f1", "f2"]));

        assert!(matches!(
            result,
            Err(Error::BadBulkResponse {
                expected: 2,
                received: 1
            })
        ));
    }

    #[test]
    fn test_bulk_delete_counts_missing_as_deleted() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/bulk/files/delete")
            .match_body(Matcher::Json(json!({"file_ids": ["f1", "f2", "f3"]})))
            .with_body(
                json!({"items": [
                    {"resource": {"id": "f1"}},
                    {"error": {"status": 404, "code": 5002, "message": "Requested file does not exist"}},
                    {"error": {"status": 400, "code": 9000, "message": "File is locked"}}
                ]})
                .to_string(),
            )
            .expect(1)
            .create();
        let client = client(&server);
        let ids = ["f1", "f2", "f3"]
            .iter()
            .map(|id| FileId(id.to_string()))
            .collect::<Vec<_>>();

        let submissions = BulkDelete { client: &client }.submit(&ids).unwrap();

        mock.assert();
        assert!(matches!(
            &submissions[0],
            Submission::Accepted(Deletion { file, already_deleted: false }) if file.0 == "f1"
        ));
        assert!(matches!(
            &submissions[1],
            Submission::Accepted(Deletion { file, already_deleted: true }) if file.0 == "f2"
        ));
        assert!(matches!(
            &submissions[2],
            Submission::Rejected(error) if error.status == Some(400)
        ));
    }
}
