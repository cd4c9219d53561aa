mod client;
mod dashboard;

pub use client::{Auth, DashboardRef, DashboardWrite, Folder, GrafanaClient, GrafanaError};
pub use dashboard::{Dashboard, RewriteError, set_panel_datasources};
