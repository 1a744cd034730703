//! Request payload contracts and validation aggregation.

use std::error::Error as StdError;
use std::fmt;

/// Boxed error used for individual validation failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Contract for create and patch request payloads.
///
/// The pipelines are generic over any type implementing this trait.
/// `has_changes` only matters for patch payloads; create payloads keep
/// the default.
///
/// # Example
///
/// ```
/// use thales_core::{BoxError, Dto};
///
/// struct Rename {
///     name: Option<String>,
/// }
///
/// impl Dto for Rename {
///     fn validate(&self) -> Vec<BoxError> {
///         match &self.name {
///             Some(name) if name.is_empty() => vec!["name must not be empty".into()],
///             _ => Vec::new(),
///         }
///     }
///
///     fn has_changes(&self) -> bool {
///         self.name.is_some()
///     }
/// }
///
/// assert!(!Rename { name: None }.has_changes());
/// assert_eq!(Rename { name: Some(String::new()) }.validate().len(), 1);
/// ```
pub trait Dto {
    /// Returns every semantic error in the payload; empty when valid.
    fn validate(&self) -> Vec<BoxError>;

    /// Whether the payload modifies anything.
    fn has_changes(&self) -> bool {
        true
    }
}

/// Aggregate of zero or more validation failures.
///
/// Displays as a single flattened message and keeps every underlying
/// error reachable, so callers can test for a specific failure inside
/// the aggregate with [`find`](Self::find) or [`contains`](Self::contains).
#[derive(Debug, Default)]
pub struct ValidationWrapperError {
    errors: Vec<BoxError>,
}

impl ValidationWrapperError {
    /// Wraps the given errors.
    #[must_use]
    pub fn new(errors: Vec<BoxError>) -> Self {
        Self { errors }
    }

    /// Runs [`Dto::validate`] and wraps the result, or returns `Ok` when
    /// there is nothing to report.
    pub fn check<D: Dto + ?Sized>(dto: &D) -> Result<(), Self> {
        let errors = dto.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self::new(errors))
        }
    }

    /// Number of wrapped errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no error is wrapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterates over the wrapped errors.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn StdError + Send + Sync + 'static)> {
        self.errors.iter().map(AsRef::as_ref)
    }

    /// Returns the first wrapped error of type `E`.
    #[must_use]
    pub fn find<E: StdError + 'static>(&self) -> Option<&E> {
        self.errors.iter().find_map(|err| err.downcast_ref::<E>())
    }

    /// Whether any wrapped error is of type `E`.
    #[must_use]
    pub fn contains<E: StdError + 'static>(&self) -> bool {
        self.find::<E>().is_some()
    }

    /// One message per wrapped error.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Consumes the aggregate, returning the wrapped errors.
    #[must_use]
    pub fn into_inner(self) -> Vec<BoxError> {
        self.errors
    }
}

impl fmt::Display for ValidationWrapperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return f.write_str("validation failed");
        }
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl StdError for ValidationWrapperError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.errors
            .first()
            .map(|err| err.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<Vec<BoxError>> for ValidationWrapperError {
    fn from(errors: Vec<BoxError>) -> Self {
        Self::new(errors)
    }
}
