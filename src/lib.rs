//! Publication-trend analysis pipeline: filter a corpus of research papers,
//! aggregate it, rank topics by their relayed growth figures, derive
//! recommendations and assemble a report.

pub mod aggregate;
pub mod corpus;
pub mod export;
pub mod filter;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod synthetic;
pub mod trend;

pub use corpus::{CollaborationEdge, Corpus, Institution, PublicationRecord, Topic, TrendLabel};
pub use filter::Criteria;
pub use pipeline::{run, PipelineOutput, Stage};
