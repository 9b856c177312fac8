mod advisor_error;
mod advisor_query;
mod http_advisor;
#[cfg(test)]
mod tests;

pub use advisor_error::AdvisorError;
pub use advisor_query::AdvisorQuery;
pub use http_advisor::{HttpAdvisor, MissionAdvisor};
