// ABOUTME: Page and page criteria value objects for windowed named queries
// ABOUTME: Criteria carry named parameters plus a window; a page carries the window's elements

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::query::{QueryParameters, QueryValue};

/// Default page size for paginated queries
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size to prevent performance issues
pub const MAX_PAGE_SIZE: i64 = 100;

/// One window of a named query's result.
///
/// `number_of_elements` is the size of the full result set when the page was
/// read from position 0. Later pages report the lower bound the window proves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<E> {
    pub elements: Vec<E>,
    pub first_position: i64,
    pub number_of_elements: i64,
}

impl<E> Page<E> {
    pub fn new(elements: Vec<E>, first_position: i64, number_of_elements: i64) -> Self {
        Self {
            elements,
            first_position,
            number_of_elements,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Convert the elements while keeping the window
    pub fn map<F, U>(self, f: F) -> Page<U>
    where
        F: FnMut(E) -> U,
    {
        Page {
            elements: self.elements.into_iter().map(f).collect(),
            first_position: self.first_position,
            number_of_elements: self.number_of_elements,
        }
    }
}

impl<E> Default for Page<E> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<E> PartialEq for Page<E> {
    fn eq(&self, other: &Self) -> bool {
        self.first_position == other.first_position
            && self.number_of_elements == other.number_of_elements
    }
}

impl<E> Eq for Page<E> {}

impl<E> PartialOrd for Page<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Page<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.first_position
            .cmp(&other.first_position)
            .then(self.number_of_elements.cmp(&other.number_of_elements))
    }
}

/// A named value used as a page criterion. Two parameters are equal when
/// their names are equal.
#[derive(Debug, Clone)]
pub struct QueryParameter {
    pub name: String,
    pub value: QueryValue,
}

impl QueryParameter {
    pub fn new(name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl PartialEq for QueryParameter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for QueryParameter {}

impl Hash for QueryParameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Collects named query parameters for a [`PageCriteria`]
#[derive(Debug, Default, Clone)]
pub struct QueryParametersBuilder {
    parameters: Vec<QueryParameter>,
}

impl QueryParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        let parameter = QueryParameter::new(name, value);
        match self.parameters.iter_mut().find(|p| **p == parameter) {
            Some(existing) => *existing = parameter,
            None => self.parameters.push(parameter),
        }
        self
    }

    pub fn build(self) -> Vec<QueryParameter> {
        self.parameters
    }
}

/// Which window of a named query to read, and with which parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PageCriteria {
    pub query_parameters: Vec<QueryParameter>,
    pub first_position: i64,
    pub page_size: i64,
}

impl PageCriteria {
    pub fn new(first_position: i64, page_size: i64) -> Self {
        Self {
            query_parameters: Vec::new(),
            first_position,
            page_size,
        }
    }

    pub fn with_query_parameters(mut self, query_parameters: Vec<QueryParameter>) -> Self {
        self.query_parameters = query_parameters;
        self
    }

    /// Named parameters for the query, or `None` when the criteria carry none
    pub fn to_query_parameters(&self) -> Option<QueryParameters> {
        if self.query_parameters.is_empty() {
            return None;
        }
        let params = self
            .query_parameters
            .iter()
            .fold(QueryParameters::named(), |builder, p| {
                builder.with_parameter(p.name.clone(), p.value.clone())
            })
            .build();
        Some(params)
    }
}

impl Default for PageCriteria {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}
