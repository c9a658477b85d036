use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::Difficulty;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// A recipe as handed to callers: associations are always flat entity lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub cooking_time: i32,
    pub servings: i32,
    pub difficulty: Difficulty,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
}

/// Payload for creating or editing a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeFormData {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default = "default_cooking_time")]
    pub cooking_time: i32,
    #[serde(default = "default_servings")]
    pub servings: i32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

const fn default_cooking_time() -> i32 {
    30
}

const fn default_servings() -> i32 {
    4
}

impl RecipeFormData {
    /// Drops blank image URLs and duplicate association ids, keeping first-seen order.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.image_url = self
            .image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        self.category_ids = dedup_ids(self.category_ids);
        self.tag_ids = dedup_ids(self.tag_ids);
        self
    }
}

/// Partial edit of a recipe. Absent fields keep their stored value.
///
/// `image_url: ""` clears the image; omitting it keeps the current one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub instructions: Option<Vec<String>>,
    pub cooking_time: Option<i32>,
    pub servings: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub image_url: Option<String>,
    pub category_ids: Option<Vec<String>>,
    pub tag_ids: Option<Vec<String>>,
}

impl RecipePatch {
    /// Overlays the present fields onto `current`, producing a full form.
    #[must_use]
    pub fn apply_to(self, current: &Recipe) -> RecipeFormData {
        RecipeFormData {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
            ingredients: self
                .ingredients
                .unwrap_or_else(|| current.ingredients.clone()),
            instructions: self
                .instructions
                .unwrap_or_else(|| current.instructions.clone()),
            cooking_time: self.cooking_time.unwrap_or(current.cooking_time),
            servings: self.servings.unwrap_or(current.servings),
            difficulty: self.difficulty.unwrap_or(current.difficulty),
            image_url: self.image_url.or_else(|| current.image_url.clone()),
            category_ids: self.category_ids.unwrap_or_else(|| {
                current.categories.iter().map(|c| c.id.clone()).collect()
            }),
            tag_ids: self
                .tag_ids
                .unwrap_or_else(|| current.tags.iter().map(|t| t.id.clone()).collect()),
        }
    }
}

fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    ids.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

/// Listing filters. Every field is optional and they combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Case-insensitive substring of the title.
    pub term: Option<String>,
    pub difficulty: Option<Difficulty>,
    /// The recipe must carry every listed category.
    pub category_ids: Option<BTreeSet<String>>,
    /// The recipe must carry every listed tag.
    pub tag_ids: Option<BTreeSet<String>>,
}

impl SearchCriteria {
    #[must_use]
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    #[must_use]
    pub const fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    #[must_use]
    pub fn with_categories<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Collapses blank terms and empty id sets to "absent".
    #[must_use]
    pub fn normalized(self) -> Self {
        let clean_set = |set: Option<BTreeSet<String>>| {
            set.map(|s| {
                s.into_iter()
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
                    .collect::<BTreeSet<_>>()
            })
            .filter(|s| !s.is_empty())
        };

        Self {
            term: self
                .term
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            difficulty: self.difficulty,
            category_ids: clean_set(self.category_ids),
            tag_ids: clean_set(self.tag_ids),
        }
    }

    #[must_use]
    pub const fn is_unfiltered(&self) -> bool {
        self.term.is_none()
            && self.difficulty.is_none()
            && self.category_ids.is_none()
            && self.tag_ids.is_none()
    }
}
