pub mod claude;
pub mod error;
pub mod util;

pub use claude::Claude;
pub use error::AiError;
pub use util::truncate_chars;
