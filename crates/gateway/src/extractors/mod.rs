//! Request extractors mapping rejections onto the API error body.

mod json_body;
mod validated_query;

pub use json_body::JsonBody;
pub use validated_query::ValidatedQuery;
