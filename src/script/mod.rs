pub mod interp;
pub mod token;

pub use interp::Interpreter;
pub use token::split_tokens;
