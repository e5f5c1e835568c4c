// Selection validator - everything shown together must share one category
use crate::domain::category::{Category, HasCategory};
use crate::domain::errors::AnalysisError;

pub struct SelectionValidator;

impl SelectionValidator {
    /// Return the shared category, or `None` for an empty candidate.
    pub fn validate<I>(items: I) -> Result<Option<Category>, AnalysisError>
    where
        I: IntoIterator,
        I::Item: HasCategory,
    {
        let mut shared: Option<Category> = None;
        for item in items {
            let category = item.category();
            match shared {
                None => shared = Some(category),
                Some(expected) if expected != category => {
                    return Err(AnalysisError::CategoryMismatch {
                        expected,
                        found: category,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(shared)
    }
}

/// An ordered selection that only ever holds a valid, single-category state.
///
/// Every mutation validates the candidate first; on rejection the set keeps
/// its last accepted contents, so one bad click never discards earlier picks.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSet<T> {
    items: Vec<T>,
}

impl<T> Default for SelectionSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: HasCategory + Clone> SelectionSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_add(&mut self, item: T) -> Result<(), AnalysisError> {
        self.try_extend(std::iter::once(item))
    }

    /// Append several items as one addition; all or nothing.
    pub fn try_extend<I: IntoIterator<Item = T>>(&mut self, items: I) -> Result<(), AnalysisError> {
        let additions: Vec<T> = items.into_iter().collect();
        SelectionValidator::validate(self.items.iter().chain(additions.iter()))?;
        self.items.extend(additions);
        Ok(())
    }

    pub fn try_replace<I: IntoIterator<Item = T>>(&mut self, items: I) -> Result<(), AnalysisError> {
        let candidate: Vec<T> = items.into_iter().collect();
        SelectionValidator::validate(candidate.iter())?;
        self.items = candidate;
        Ok(())
    }

    /// Drop every item matching `predicate`. Removal can never break the invariant.
    pub fn remove_where<F: FnMut(&T) -> bool>(&mut self, mut predicate: F) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn category(&self) -> Option<Category> {
        self.items.first().map(|item| item.category())
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
