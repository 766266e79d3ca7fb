pub mod decompress_utils;
pub mod html_utils;
pub mod page_utils;
pub mod response_utils;
