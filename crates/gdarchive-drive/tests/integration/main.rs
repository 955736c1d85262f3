//! Integration tests for gdarchive-drive
//!
//! Uses wiremock to simulate the Google Drive v3 API and verifies the
//! end-to-end behavior of root discovery, paged listing, content transfers
//! and error classification.

mod common;

mod test_content;
mod test_listing;
