mod checksum;
mod download;
mod upload;

pub use checksum::run_checksum;
pub use download::run_download;
pub use upload::run_upload;
