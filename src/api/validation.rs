use super::{ApiError, RecipeSearchQuery};
use crate::domain::Difficulty;
use crate::models::recipe::SearchCriteria;

/// Splits a comma-separated id list, ignoring empty segments.
#[must_use]
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// An empty value means "all difficulties".
pub fn parse_difficulty(raw: Option<&str>) -> Result<Option<Difficulty>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<Difficulty>()
            .map(Some)
            .map_err(|e| ApiError::validation(e.to_string())),
    }
}

pub fn validate_recipe_id(id: &str) -> Result<&str, ApiError> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed.len() > 64 {
        return Err(ApiError::validation(format!("Invalid recipe ID: {id}")));
    }
    Ok(trimmed)
}

impl RecipeSearchQuery {
    pub fn into_criteria(self) -> Result<SearchCriteria, ApiError> {
        let mut criteria = SearchCriteria {
            difficulty: parse_difficulty(self.difficulty.as_deref())?,
            ..SearchCriteria::default()
        };

        if let Some(q) = self.q {
            criteria = criteria.with_term(q);
        }
        if let Some(categories) = self.categories {
            criteria = criteria.with_categories(parse_id_list(&categories));
        }
        if let Some(tags) = self.tags {
            criteria = criteria.with_tags(parse_id_list(&tags));
        }

        Ok(criteria.normalized())
    }
}
