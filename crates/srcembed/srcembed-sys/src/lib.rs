//! Thin OS layer under the stream engine: raw descriptors, descriptor probing
//! and page-size discovery. Everything here is a direct `libc` call wrapped
//! into `io::Result`.

mod fd;
mod hint;
mod meminfo;

pub use fd::{DescriptorKind, Fd, STDIN, STDOUT};
pub use hint::advise_sequential;
pub use meminfo::{huge_page_size, parse_hugepage_size, round_up};
