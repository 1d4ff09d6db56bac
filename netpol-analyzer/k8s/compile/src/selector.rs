use anyhow::{bail, Result};
use netpol_analyzer_core::{LabelSelector, Requirement};
use netpol_analyzer_k8s_api::labels::{Expression, Operator, Selector};

/// Converts a schema selector into its evaluated form. `match_labels`
/// entries become equality requirements; expressions map onto their
/// operators.
pub(crate) fn label_selector(selector: Selector) -> Result<LabelSelector> {
    let (labels, exprs) = selector.into_parts();
    let mut requirements = Vec::with_capacity(labels.len() + exprs.len());

    for (key, value) in labels {
        requirements.push(Requirement::Equals(key, value));
    }

    for Expression {
        key,
        operator,
        values,
    } in exprs
    {
        let requirement = match (operator, values) {
            (Operator::In, Some(values)) => Requirement::In(key, values),
            (Operator::NotIn, Some(values)) => Requirement::NotIn(key, values),
            (Operator::In, None) | (Operator::NotIn, None) => {
                bail!("match expression on {key} requires values")
            }
            (Operator::Exists, None) => Requirement::Exists(key),
            (Operator::DoesNotExist, None) => Requirement::DoesNotExist(key),
            (Operator::Exists, Some(values)) | (Operator::DoesNotExist, Some(values))
                if values.is_empty() =>
            {
                match operator {
                    Operator::Exists => Requirement::Exists(key),
                    _ => Requirement::DoesNotExist(key),
                }
            }
            (Operator::Exists, Some(_)) | (Operator::DoesNotExist, Some(_)) => {
                bail!("match expression on {key} must not carry values")
            }
        };
        requirements.push(requirement);
    }

    Ok(LabelSelector::new(requirements))
}
