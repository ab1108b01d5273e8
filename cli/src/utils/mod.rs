pub mod io;
pub mod lookup;
pub mod options_file;
pub mod tables;
pub mod workflow;

pub use io::{
    confirm, read_from_stdin, read_lines, read_token_from_stdin, write_lines, LOG_PREFIX_INFO,
};
