//! This module provides a client to fetch assignments from a Canvas LMS server

use std::error::Error;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::LINK;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::traits::CourseSource;
use crate::course::CourseId;
use crate::item::SourceItem;

/// How many records are requested per page
const PAGE_SIZE: &str = "100";


/// A course source that fetches its data from the REST API of a Canvas server
pub struct Client {
    api_url: Url,
    token: String,
    http: reqwest::Client,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>, T: ToString>(api_url: S, token: T) -> Result<Self, Box<dyn Error>> {
        let api_url = Url::parse(api_url.as_ref())?;
        if api_url.cannot_be_a_base() {
            return Err(format!("{} cannot be used as an API base URL", api_url).into());
        }

        Ok(Self{
            api_url,
            token: token.to_string(),
            http: reqwest::Client::new(),
        })
    }

    /// The URL that lists the assignments of a course, along with the submission of the current user
    fn assignments_url(&self, course: CourseId) -> Result<Url, Box<dyn Error>> {
        let course_id = course.to_string();
        let mut url = self.api_url.clone();
        {
            let mut segments = url.path_segments_mut()
                .map_err(|_| format!("{} cannot be used as an API base URL", self.api_url))?;
            segments
                .pop_if_empty()
                .extend(&["api", "v1", "courses", course_id.as_str(), "assignments"]);
        }
        url.query_pairs_mut()
            .append_pair("include[]", "submission")
            .append_pair("per_page", PAGE_SIZE);
        Ok(url)
    }

    /// Get every page of a paginated list
    async fn get_all_pages<D: DeserializeOwned>(&self, url: Url) -> Result<Vec<D>, Box<dyn Error>> {
        let mut results = Vec::new();
        let mut next_url = Some(url);

        while let Some(url) = next_url {
            log::debug!("Fetching {}", url);
            let res = self.http
                .get(url.as_str())
                .bearer_auth(&self.token)
                .send()
                .await?;

            if res.status().is_success() == false {
                return Err(format!("Unexpected HTTP status code {:?} for {}", res.status(), url).into());
            }

            next_url = res.headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(next_page_url);

            let text = res.text().await?;
            let page: Vec<D> = serde_json::from_str(&text)?;
            results.extend(page);
        }

        Ok(results)
    }
}

#[async_trait]
impl CourseSource for Client {
    async fn fetch_work_items(&self, course: CourseId) -> Result<Vec<SourceItem>, Box<dyn Error>> {
        let url = self.assignments_url(course)?;
        let assignments: Vec<Assignment> = self.get_all_pages(url).await?;
        Ok(assignments.into_iter().map(SourceItem::from).collect())
    }
}


/// An assignment, as sent by the Canvas API
#[derive(Debug, Deserialize)]
struct Assignment {
    name: String,
    due_at: Option<String>,
    #[serde(default)]
    submission_types: Vec<String>,
    submission: Option<Submission>,
}

#[derive(Debug, Deserialize)]
struct Submission {
    submitted_at: Option<DateTime<Utc>>,
}

impl From<Assignment> for SourceItem {
    fn from(assignment: Assignment) -> Self {
        // Only assignments whose single submission type is "none" accept no submission.
        // A missing or empty list still gets its submission looked up
        let accepts_submissions = assignment.submission_types != ["none"];
        Self {
            name: assignment.name,
            due_at: assignment.due_at,
            accepts_submissions,
            submitted_at: assignment.submission.and_then(|s| s.submitted_at),
        }
    }
}

/// Extract the `rel="next"` target of a `Link` header
fn next_page_url(link_header: &str) -> Option<Url> {
    link_header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim().strip_prefix('<')?.strip_suffix('>')?;
        if parts.any(|param| param.trim() == r#"rel="next""#) {
            Url::parse(target).ok()
        } else {
            None
        }
    })
}
