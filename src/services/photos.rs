// src/services/photos.rs

//! Photo listing service.
//!
//! Turns the paginated listing endpoints into a sequence of [`Photo`]
//! values handed to a visitor one at a time.

use std::collections::VecDeque;
use std::ops::ControlFlow;

use futures::stream::{self, Stream};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::Credentials;
use crate::error::{AppError, Result};
use crate::models::{ApiConfig, ListingQuery, Order, Photo, Source};
use crate::services::paginator::{Page, PageRequest, Paginator};
use crate::utils::http::create_client;

/// Client for the photo listing endpoints.
#[derive(Debug, Clone)]
pub struct PhotoClient {
    client: Client,
    base_url: Url,
    per_page: Option<u32>,
    cancel: CancellationToken,
}

impl PhotoClient {
    /// Wrap an already authenticated transport.
    pub fn new(client: Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            per_page: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Build the transport from configuration.
    pub fn from_config(config: &ApiConfig, credentials: Option<&Credentials>) -> Result<Self> {
        let client = create_client(config, credentials)?;
        Ok(Self::new(client, config.base_url()?).with_per_page(config.per_page))
    }

    pub fn with_per_page(mut self, per_page: Option<u32>) -> Self {
        self.per_page = per_page;
        self
    }

    /// Stop paginating once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// First page request for a query.
    pub fn first_request(&self, query: &ListingQuery) -> Result<PageRequest> {
        let url = self.base_url.join(&query.path())?;
        let mut request = PageRequest::get(url).with_query("order_by", query.order.as_str());
        if let Some(per_page) = self.per_page {
            request = request.with_query("per_page", &per_page.to_string());
        }
        Ok(request)
    }

    /// Paginator positioned at the first page of `query`.
    pub fn pages(&self, query: &ListingQuery) -> Result<Paginator> {
        let request = self.first_request(query)?;
        Ok(Paginator::new(self.client.clone(), request).with_cancellation(self.cancel.clone()))
    }

    /// Visit every photo of `query` in page then array order.
    ///
    /// A `Break` from the visitor ends the listing without fetching
    /// another page.
    pub async fn list_photos<F>(&self, query: &ListingQuery, mut visitor: F) -> Result<()>
    where
        F: FnMut(Photo) -> Result<ControlFlow<()>>,
    {
        self.pages(query)?
            .paginate(|page| {
                for photo in decode_page(&page)? {
                    if visitor(photo)?.is_break() {
                        return Ok(ControlFlow::Break(()));
                    }
                }
                Ok(ControlFlow::Continue(()))
            })
            .await
    }

    /// Photos uploaded by `username`.
    pub async fn get_user_photos<F>(&self, username: &str, order: Order, visitor: F) -> Result<()>
    where
        F: FnMut(Photo) -> Result<ControlFlow<()>>,
    {
        let query = ListingQuery::new(Source::User(username.to_string()), order);
        self.list_photos(&query, visitor).await
    }

    /// Photos liked by `username`.
    pub async fn get_user_likes<F>(&self, username: &str, order: Order, visitor: F) -> Result<()>
    where
        F: FnMut(Photo) -> Result<ControlFlow<()>>,
    {
        let query = ListingQuery::new(Source::UserLikes(username.to_string()), order);
        self.list_photos(&query, visitor).await
    }

    /// Photos in collection `id`.
    pub async fn get_collection<F>(&self, id: &str, order: Order, visitor: F) -> Result<()>
    where
        F: FnMut(Photo) -> Result<ControlFlow<()>>,
    {
        let query = ListingQuery::new(Source::Collection(id.to_string()), order);
        self.list_photos(&query, visitor).await
    }

    /// The listing as a lazy, single-pass stream.
    ///
    /// Pages are fetched only as the stream is polled; dropping it stops
    /// the listing.
    pub fn photo_stream(
        &self,
        query: &ListingQuery,
    ) -> Result<impl Stream<Item = Result<Photo>> + Send + 'static> {
        let pages = self.pages(query)?;
        Ok(stream::try_unfold(
            (pages, VecDeque::<Photo>::new()),
            |(mut pages, mut buffer)| async move {
                loop {
                    if let Some(photo) = buffer.pop_front() {
                        return Ok::<_, AppError>(Some((photo, (pages, buffer))));
                    }
                    match pages.next_page().await? {
                        Some(page) => buffer.extend(decode_page(&page)?),
                        None => return Ok(None),
                    }
                }
            },
        ))
    }
}

/// Decode one listing page into photos.
fn decode_page(page: &Page) -> Result<Vec<Photo>> {
    page.ensure_success()?;
    let photos: Vec<Photo> = serde_json::from_slice(&page.body)?;
    log::debug!("Page {} held {} photos", page.number, photos.len());
    Ok(photos)
}
