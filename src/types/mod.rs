// ABOUTME: Validated domain types shared across the deployment pipeline.
// ABOUTME: Application names and exclude patterns are checked once at config load.

mod app_name;
mod exclude;

pub use app_name::{AppName, AppNameError, MAX_APP_NAME_LEN};
pub use exclude::{ExcludePattern, ExcludePatternError, is_excluded};
