//! Validated query string extractor.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use common::AppError;
use domain::FieldError;

/// Query extractor that validates the parsed parameters.
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::Validation(field_errors(&e)))?;

        Ok(ValidatedQuery(value))
    }
}

/// Flatten validator output into wire field errors, sorted by field.
fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let name = camel_case(field.as_ref());
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", name));
                FieldError::new(name.clone(), message)
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(range(min = 1, message = "Page must be at least 1"))]
        page_number: u64,
        #[validate(length(max = 3))]
        search: String,
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("project_id"), "projectId");
        assert_eq!(camel_case("page"), "page");
    }

    #[test]
    fn test_field_errors_named_for_the_wire() {
        let sample = Sample {
            page_number: 0,
            search: "toolong".to_string(),
        };
        let errors = sample.validate().unwrap_err();
        let fields = field_errors(&errors);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "pageNumber");
        assert_eq!(fields[0].message, "Page must be at least 1");
        assert_eq!(fields[1].field, "search");
        assert_eq!(fields[1].message, "search is invalid");
    }
}
