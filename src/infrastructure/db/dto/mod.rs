pub mod delivery_record;
pub mod subscription;
pub mod webhook_job;

pub use delivery_record::DeliveryRecordRow;
pub use subscription::SubscriptionRow;
pub use webhook_job::{WebhookJobRow, WebhookJobStats};
