//! Résumé vs. job-description analysis: payload construction, response
//! validation and the `/analyze` handler.

pub mod handlers;
pub mod payload;
pub mod prompts;
pub mod schema;
pub mod validator;
