pub mod describer;
pub mod mock;
pub mod vision;

pub use describer::Describer;
pub use mock::MockVisionProvider;
pub use vision::OpenAiVisionProvider;
