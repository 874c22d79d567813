pub mod scenarios;
pub mod test_set;

pub use scenarios::{ScenarioReport, ScenarioResult, ScenarioRunner};
pub use test_set::{Expectation, QAPair, SKY_DOCUMENT, get_test_set, score_answer};
