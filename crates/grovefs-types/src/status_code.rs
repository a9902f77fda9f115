/// Status code type alias, `u16` like an errno-style code.
#[allow(non_camel_case_types)]
pub type status_code_t = u16;

/// Common status codes (0-999).
pub mod StatusCode {
    use super::status_code_t;

    pub const OK: status_code_t = 0;
    pub const NOT_IMPLEMENTED: status_code_t = 1;
    pub const INVALID_ARG: status_code_t = 3;
    pub const INVALID_CONFIG: status_code_t = 4;
    pub const INTERRUPTED: status_code_t = 27;
    pub const INVALID_FORMAT: status_code_t = 33;
    pub const IO_ERROR: status_code_t = 69;
    pub const OS_ERROR: status_code_t = 72;
    pub const UNKNOWN: status_code_t = 999;
}

/// Namespace (filesystem) status codes (3xxx).
pub mod FsCode {
    use super::status_code_t;

    pub const NOT_FOUND: status_code_t = 3000;
    pub const NOT_EMPTY: status_code_t = 3001;
    pub const NOT_DIRECTORY: status_code_t = 3003;
    pub const IS_DIRECTORY: status_code_t = 3004;
    pub const EXISTS: status_code_t = 3005;
    pub const NO_PERMISSION: status_code_t = 3006;
    pub const NOT_SYMLINK: status_code_t = 3007;
    pub const TIMEOUT: status_code_t = 3010;
    pub const BUSY: status_code_t = 3011;
}

/// Async-job tracking status codes (4xxx).
pub mod JobCode {
    use super::status_code_t;

    pub const INDEX_CORRUPT: status_code_t = 4000;
    pub const BAD_SUBVOLUME_PATH: status_code_t = 4001;
    pub const SOURCE_MISSING: status_code_t = 4002;
}

/// Which subsystem a status code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCodeType {
    Common,
    Fs,
    Job,
    Invalid,
}

/// Classify a status code by its numeric range.
pub fn status_code_type(code: status_code_t) -> StatusCodeType {
    match code {
        0..=999 => StatusCodeType::Common,
        3000..=3999 => StatusCodeType::Fs,
        4000..=4999 => StatusCodeType::Job,
        _ => StatusCodeType::Invalid,
    }
}

/// Human-readable name for a status code.
pub fn to_string(code: status_code_t) -> &'static str {
    match code {
        StatusCode::OK => "OK",
        StatusCode::NOT_IMPLEMENTED => "NotImplemented",
        StatusCode::INVALID_ARG => "InvalidArg",
        StatusCode::INVALID_CONFIG => "InvalidConfig",
        StatusCode::INTERRUPTED => "Interrupted",
        StatusCode::INVALID_FORMAT => "InvalidFormat",
        StatusCode::IO_ERROR => "IOError",
        StatusCode::OS_ERROR => "OSError",
        StatusCode::UNKNOWN => "Unknown",

        FsCode::NOT_FOUND => "Fs::NotFound",
        FsCode::NOT_EMPTY => "Fs::NotEmpty",
        FsCode::NOT_DIRECTORY => "Fs::NotDirectory",
        FsCode::IS_DIRECTORY => "Fs::IsDirectory",
        FsCode::EXISTS => "Fs::Exists",
        FsCode::NO_PERMISSION => "Fs::NoPermission",
        FsCode::NOT_SYMLINK => "Fs::NotSymlink",
        FsCode::TIMEOUT => "Fs::Timeout",
        FsCode::BUSY => "Fs::Busy",

        JobCode::INDEX_CORRUPT => "Job::IndexCorrupt",
        JobCode::BAD_SUBVOLUME_PATH => "Job::BadSubvolumePath",
        JobCode::SOURCE_MISSING => "Job::SourceMissing",

        _ => "Unrecognized",
    }
}
