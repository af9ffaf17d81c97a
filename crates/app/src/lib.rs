//! Artisan portal: tenants, credentials, the submission ledger and the
//! services behind the portal endpoints.

pub mod context;
pub mod crm;
pub mod database;
pub mod dispatch;
pub mod domain;
pub mod mailer;
pub mod storage;

#[cfg(test)]
mod test;

pub mod uuids;
