//! Results of terminal data functions and the boxed function types the
//! endpoints hold.
//!
//! A terminal fetch resolves to one of a closed set of shapes:
//!
//! | Shape | Produced by | Rendered as |
//! |-------|-------------|-------------|
//! | [`Fetched::Value`] | single-resource fetch | serialized value |
//! | [`Fetched::Stream`] | single-resource fetch | raw bytes, sniffed content type |
//! | [`Listed::Items`] | list fetch | array; `None` renders as `[]` |
//! | [`Listed::Rows`] | list fetch | array, buffered before rendering |

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use futures_util::Stream;
use thales_core::{DataContext, DataResult, Paging};
use thales_middleware::{BoxFuture, ByteStream};
use uuid::Uuid;

/// A single fetched resource.
pub enum Fetched<T> {
    /// A value to serialize.
    Value(T),
    /// Raw content streamed as-is.
    Stream(ByteStream),
}

impl<T> Fetched<T> {
    /// Wraps a byte stream.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<bytes::Bytes, std::io::Error>> + Send + 'static,
    {
        Self::Stream(Box::pin(stream))
    }
}

impl<T> From<T> for Fetched<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Fetched<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Transformed rows of a list, yielded one at a time.
pub type RowStream<T> = BoxStream<'static, DataResult<T>>;

/// A fetched page of a list.
pub enum Listed<T> {
    /// A materialized page; `None` is an empty page.
    Items(Option<Vec<T>>),
    /// Rows read lazily and transformed into items.
    Rows(RowStream<T>),
}

impl<T: Send + 'static> Listed<T> {
    /// Reads `rows` and maps each through `transform`.
    pub fn rows<R, S, F>(rows: S, transform: F) -> Self
    where
        R: Send + 'static,
        S: Stream<Item = DataResult<R>> + Send + 'static,
        F: Fn(R) -> DataResult<T> + Send + 'static,
    {
        Self::Rows(rows.map(move |row| row.and_then(&transform)).boxed())
    }

    /// Same as [`rows`](Self::rows) for rows already read into memory.
    pub fn from_rows<R, I, F>(rows: I, transform: F) -> Self
    where
        R: Send + 'static,
        I: IntoIterator<Item = DataResult<R>>,
        I::IntoIter: Send + 'static,
        F: Fn(R) -> DataResult<T> + Send + 'static,
    {
        Self::rows(stream::iter(rows), transform)
    }

    /// Buffers every item. A row error discards the rows read so far.
    pub async fn collect(self) -> DataResult<Vec<T>> {
        match self {
            Self::Items(items) => Ok(items.unwrap_or_default()),
            Self::Rows(rows) => rows.try_collect().await,
        }
    }
}

impl<T> From<Vec<T>> for Listed<T> {
    fn from(items: Vec<T>) -> Self {
        Self::Items(Some(items))
    }
}

impl<T> From<Option<Vec<T>>> for Listed<T> {
    fn from(items: Option<Vec<T>>) -> Self {
        Self::Items(items)
    }
}

impl<T: fmt::Debug> fmt::Debug for Listed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Items(items) => f.debug_tuple("Items").field(items).finish(),
            Self::Rows(_) => f.write_str("Rows(..)"),
        }
    }
}

/// Fetches one entity.
pub type FetchFn<T> =
    Arc<dyn Fn(DataContext, Uuid) -> BoxFuture<'static, DataResult<Fetched<T>>> + Send + Sync>;

/// Fetches one page of a list.
pub type ListFn<T> =
    Arc<dyn Fn(DataContext, Paging) -> BoxFuture<'static, DataResult<Listed<T>>> + Send + Sync>;

/// Creates an entity from a decoded payload.
pub type CreateFn<D, R> =
    Arc<dyn Fn(DataContext, Uuid, D) -> BoxFuture<'static, DataResult<R>> + Send + Sync>;

/// Applies a decoded patch, given the client's `If-Unmodified-Since`.
pub type PatchFn<D, R> = Arc<
    dyn Fn(DataContext, Uuid, D, DateTime<Utc>) -> BoxFuture<'static, DataResult<R>> + Send + Sync,
>;

/// Wraps an async closure as a [`FetchFn`].
pub fn fetch_fn<T, F, Fut>(f: F) -> FetchFn<T>
where
    F: Fn(DataContext, Uuid) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DataResult<Fetched<T>>> + Send + 'static,
{
    Arc::new(move |ctx, id| Box::pin(f(ctx, id)))
}

/// Wraps an async closure as a [`ListFn`].
pub fn list_fn<T, F, Fut>(f: F) -> ListFn<T>
where
    F: Fn(DataContext, Paging) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DataResult<Listed<T>>> + Send + 'static,
{
    Arc::new(move |ctx, paging| Box::pin(f(ctx, paging)))
}

/// Wraps an async closure as a [`CreateFn`].
pub fn create_fn<D, R, F, Fut>(f: F) -> CreateFn<D, R>
where
    F: Fn(DataContext, Uuid, D) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DataResult<R>> + Send + 'static,
{
    Arc::new(move |ctx, id, dto| Box::pin(f(ctx, id, dto)))
}

/// Wraps an async closure as a [`PatchFn`].
pub fn patch_fn<D, R, F, Fut>(f: F) -> PatchFn<D, R>
where
    F: Fn(DataContext, Uuid, D, DateTime<Utc>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DataResult<R>> + Send + 'static,
{
    Arc::new(move |ctx, id, dto, since| Box::pin(f(ctx, id, dto, since)))
}
