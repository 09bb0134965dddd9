pub mod frontends;
pub mod scopes;
pub mod value_evaluation;
