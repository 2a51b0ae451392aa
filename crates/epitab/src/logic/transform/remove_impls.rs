use crate::logic::Formula;

use super::transformer::FormulaTransformer;

/// Rewrites every `φ -> ψ` into `~φ v ψ`.
pub fn remove_implications(formula: &Formula) -> Formula {
    RemoveImplications.transform(formula)
}

struct RemoveImplications;

impl FormulaTransformer for RemoveImplications {
    fn transform_impl(&mut self, left: &Formula, right: &Formula) -> Formula {
        let left = self.transform(left);
        let right = self.transform(right);
        Formula::or(Formula::not(left), right)
    }
}
