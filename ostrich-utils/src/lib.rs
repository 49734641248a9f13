pub mod collections;
pub mod path;
pub mod text;

pub use collections::{listify, listify_one};
pub use path::{
    commonpath, commonpath_args, host_commonpath, nt_commonpath, nt_commonpath_bytes,
    posix_commonpath, posix_commonpath_bytes, split_drive, split_drive_str, PathArg, PathStyle,
};
pub use text::{as_text, get_safe_path, get_safe_path_bytes, DecodeErrors};
