//! # sf-bulkjobs-auth
//!
//! Session context for the bulk job layer.
//!
//! Obtaining or refreshing tokens happens elsewhere; this crate only carries
//! the result: instance URL, API version and bearer token, behind the
//! [`Credentials`] trait.
//!
//! ## Security
//!
//! - Access tokens are redacted in Debug output
//! - Error messages never include credential values
//!
//! ## Example
//!
//! ```rust,ignore
//! use sf_bulkjobs_auth::{Credentials, SalesforceCredentials};
//!
//! // SF_INSTANCE_URL, SF_ACCESS_TOKEN, optional SF_API_VERSION
//! let creds = SalesforceCredentials::from_env()?;
//! println!("{}", creds.bulk_api_url());
//! ```

mod credentials;
mod error;

pub use credentials::{Credentials, SalesforceCredentials, DEFAULT_API_VERSION};
pub use error::{Error, ErrorKind, Result};
