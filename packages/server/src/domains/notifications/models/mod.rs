pub mod device_token;
pub mod notification;

pub use device_token::DeviceToken;
pub use notification::Notification;
