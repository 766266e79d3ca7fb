mod upstream_headers_extractor;

pub use upstream_headers_extractor::*;
