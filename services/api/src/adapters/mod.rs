pub mod command_llm;
pub mod repository;
pub mod sst;

pub use command_llm::OpenAiCommandAdapter;
pub use repository::{JsonFileRepository, MemoryRepository};
pub use sst::OpenAiSstAdapter;
