pub mod event_bus;
pub mod router;
pub mod types;

pub use event_bus::{NotificationBus, NotificationSubscriber};
pub use router::EventRouter;
pub use types::{Notification, NotificationEvent};
