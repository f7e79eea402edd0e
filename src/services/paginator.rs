// src/services/paginator.rs

//! Cursor-following pagination over `Link: <...>; rel="next"` headers.
//!
//! A [`Paginator`] owns exactly one [`PageRequest`] and walks the `next`
//! relation chain one request at a time. It can be driven as a lazy
//! sequence with [`Paginator::next_page`] or with a callback through
//! [`Paginator::paginate`].

use std::ops::ControlFlow;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{AppError, Result};
use crate::utils::{http::api_message, link, resolve_url};

/// Mutable cursor state for one listing.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub method: Method,
    pub url: Url,
}

impl PageRequest {
    /// A GET request for the given URL.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
        }
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }
}

/// One fetched page with its body fully read.
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based position in the relation chain
    pub number: usize,
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Page {
    /// Fail with [`AppError::Api`] unless the status is 2xx.
    pub fn ensure_success(&self) -> Result<()> {
        if self.status.is_success() {
            return Ok(());
        }
        let body = String::from_utf8_lossy(&self.body);
        Err(AppError::api(
            self.status.as_u16(),
            self.url.as_str(),
            api_message(&body, self.status),
        ))
    }
}

#[derive(Debug)]
enum Cursor {
    Next(PageRequest),
    Malformed(AppError),
    Done,
}

/// Walks a paginated resource one page at a time.
#[derive(Debug)]
pub struct Paginator {
    client: Client,
    cursor: Cursor,
    cancel: CancellationToken,
    requests: usize,
}

impl Paginator {
    /// Start a new pagination at `request`.
    pub fn new(client: Client, request: PageRequest) -> Self {
        Self {
            client,
            cursor: Cursor::Next(request),
            cancel: CancellationToken::new(),
            requests: 0,
        }
    }

    /// Stop issuing requests once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Number of HTTP requests issued so far.
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Fetch the next page, or `None` once the chain is exhausted.
    ///
    /// A malformed `next` link on the previous page is reported here, so a
    /// consumer that stops early never sees it. After an error the
    /// paginator is finished.
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        let request = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Next(request) => request,
            Cursor::Malformed(err) => return Err(err),
            Cursor::Done => return Ok(None),
        };

        if self.cancel.is_cancelled() {
            log::debug!("Pagination cancelled before requesting {}", request.url);
            return Ok(None);
        }

        log::info!("Requesting {} {}", request.method, request.url);
        self.requests += 1;
        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .send()
            .await?;

        let status = response.status();
        let url = response.url().clone();
        let headers = response.headers().clone();
        log::info!("Response was {} for {}", status, url);

        let next = match next_link(&url, &headers) {
            Ok(Some(next)) => Cursor::Next(PageRequest {
                method: request.method,
                url: next,
            }),
            Ok(None) => Cursor::Done,
            Err(err) => Cursor::Malformed(err),
        };

        let body = response.bytes().await?.to_vec();
        self.cursor = next;

        Ok(Some(Page {
            number: self.requests,
            url,
            status,
            headers,
            body,
        }))
    }

    /// Feed every page to `handler` until it breaks, fails, or the chain ends.
    pub async fn paginate<F>(mut self, mut handler: F) -> Result<()>
    where
        F: FnMut(Page) -> Result<ControlFlow<()>>,
    {
        while let Some(page) = self.next_page().await? {
            if handler(page)?.is_break() {
                return Ok(());
            }
        }
        Ok(())
    }
}

/// Paginate from `request` with `handler`.
pub async fn paginate<F>(client: &Client, request: PageRequest, handler: F) -> Result<()>
where
    F: FnMut(Page) -> Result<ControlFlow<()>>,
{
    Paginator::new(client.clone(), request).paginate(handler).await
}

/// Resolve the `next` relation of a response against its URL.
fn next_link(current: &Url, headers: &HeaderMap) -> Result<Option<Url>> {
    let links = link::from_headers(headers)?;
    let Some(uri) = link::find_rel(&links, "next") else {
        return Ok(None);
    };
    resolve_url(current, uri)
        .map(Some)
        .map_err(|e| AppError::link(format!("malformed next link {uri:?}: {e}")))
}
