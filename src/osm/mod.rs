pub mod parser;

pub use parser::{InputError, load_response, parse_features};
