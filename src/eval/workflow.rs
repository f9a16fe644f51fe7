//! Candidate workflows: preprocessing recipes paired with classifiers
//!
//! The standard grid crosses three imputation strategies with two encoding
//! styles, then pairs each recipe with its compatible model family. Dummy
//! coding keeps the linear model identifiable, so those recipes carry
//! logistic regression; one-hot coding preserves symmetric distances, so
//! those recipes carry the two KNN classifiers.

use crate::model::ModelSpec;
use crate::pipeline::{EncodingStyle, ImputeStrategy, RecipeSpec};

/// Categorical columns that receive an explicit missing level
const UNKNOWN_FILL_COLUMNS: [&str; 1] = ["Embarked"];

/// One candidate pairing of a recipe and a model
#[derive(Debug, Clone)]
pub struct Workflow {
    pub recipe: RecipeSpec,
    pub model: ModelSpec,
}

impl Workflow {
    pub fn new(recipe: RecipeSpec, model: ModelSpec) -> Self {
        Self { recipe, model }
    }

    /// Identifier like "mean_dummy_logreg" or "knn_onehot_knn10"
    pub fn id(&self) -> String {
        format!("{}_{}", self.recipe.name, self.model.name())
    }
}

/// The six standard recipes, dummy-coded first
pub fn default_recipes() -> Vec<RecipeSpec> {
    let mut recipes = Vec::new();
    for encoding in [EncodingStyle::Dummy, EncodingStyle::OneHot] {
        for impute in [
            ImputeStrategy::Mean,
            ImputeStrategy::Median,
            ImputeStrategy::Knn,
        ] {
            let name = format!("{}_{}", impute.label(), encoding.label());
            recipes.push(RecipeSpec::new(
                &name,
                impute,
                encoding,
                &UNKNOWN_FILL_COLUMNS,
            ));
        }
    }
    recipes
}

/// The nine standard workflows, in declaration order
pub fn build_workflow_grid() -> Vec<Workflow> {
    let mut grid = Vec::new();
    for recipe in default_recipes() {
        match recipe.encoding {
            EncodingStyle::Dummy => {
                grid.push(Workflow::new(recipe, ModelSpec::Logistic));
            }
            EncodingStyle::OneHot => {
                grid.push(Workflow::new(recipe.clone(), ModelSpec::Knn { k: 5 }));
                grid.push(Workflow::new(recipe, ModelSpec::Knn { k: 10 }));
            }
        }
    }
    grid
}
