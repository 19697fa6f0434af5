pub mod builder;
pub mod engine;
pub mod error;
pub mod runner;
pub mod stage;
pub mod template;

pub use builder::{ExportTarget, PipelineBuilder, PipelineInstance, DEFAULT_BASE_URL};
pub use engine::{pdal::PdalEngine, PipelineEngine};
pub use error::{ConfigurationError, EngineError, TemplateError};
pub use runner::PipelineRunner;
pub use template::PipelineTemplate;
